// Replay of newline-delimited JSON pose frames from a file or stdin.
// Invariants: frame pacing follows `t_ms` offsets when present;
// EOF ends the stream unless looping a file.

use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use gesture_core::{parse_frame, PoseFrame};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader, Lines};
use tokio::time;
use tracing::info;

use super::{PoseSource, SourceError};
use crate::constants::REPLAY_EMPTY_BACKOFF_MS;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ReplayInput {
    Stdin,
    File(PathBuf),
    /// An already-open reader, named for logs; it cannot be reopened.
    Reader(String),
}

impl fmt::Display for ReplayInput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReplayInput::Stdin => f.write_str("stdin"),
            ReplayInput::File(path) => write!(f, "{}", path.display()),
            ReplayInput::Reader(name) => f.write_str(name),
        }
    }
}

type LineReader = Lines<Box<dyn AsyncBufRead + Unpin + Send>>;

pub struct ReplaySource {
    input: ReplayInput,
    lines: LineReader,
    pace: bool,
    looping: bool,
    last_offset: Option<u64>,
    line_no: u64,
    has_record: bool,
}

impl ReplaySource {
    pub async fn open(input: ReplayInput, pace: bool, looping: bool) -> std::io::Result<Self> {
        let lines = open_lines(&input).await?;
        info!(%input, pace, looping, "pose replay started");
        Ok(Self {
            input,
            lines,
            pace,
            looping,
            last_offset: None,
            line_no: 0,
            has_record: false,
        })
    }

    /// Replays from an already-open reader; never loops.
    pub fn from_reader<R>(reader: R, name: impl Into<String>, pace: bool) -> Self
    where
        R: AsyncBufRead + Unpin + Send + 'static,
    {
        let reader: Box<dyn AsyncBufRead + Unpin + Send> = Box::new(reader);
        Self {
            input: ReplayInput::Reader(name.into()),
            lines: reader.lines(),
            pace,
            looping: false,
            last_offset: None,
            line_no: 0,
            has_record: false,
        }
    }

    pub fn input(&self) -> &ReplayInput {
        &self.input
    }

    async fn restart(&mut self) -> std::io::Result<()> {
        if !self.has_record {
            time::sleep(Duration::from_millis(REPLAY_EMPTY_BACKOFF_MS)).await;
        }
        self.lines = open_lines(&self.input).await?;
        self.last_offset = None;
        self.line_no = 0;
        self.has_record = false;
        info!(input = %self.input, "pose replay restarted");
        Ok(())
    }

    async fn pace_to(&mut self, offset_ms: u64) {
        if let Some(last) = self.last_offset {
            let delay_ms = offset_ms.saturating_sub(last);
            if delay_ms > 0 {
                time::sleep(Duration::from_millis(delay_ms)).await;
            }
        }
        self.last_offset = Some(offset_ms);
    }
}

impl PoseSource for ReplaySource {
    async fn next_frame(&mut self) -> Option<Result<PoseFrame, SourceError>> {
        loop {
            let line = match self.lines.next_line().await {
                Ok(Some(line)) => line,
                Ok(None) => {
                    if self.looping && matches!(self.input, ReplayInput::File(_)) {
                        if let Err(err) = self.restart().await {
                            return Some(Err(SourceError::Io(err)));
                        }
                        continue;
                    }
                    info!(input = %self.input, lines = self.line_no, "pose replay finished");
                    return None;
                }
                Err(err) => return Some(Err(SourceError::Io(err))),
            };
            self.line_no += 1;

            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            let frame = match parse_frame(line.as_bytes()) {
                Ok(frame) => frame,
                Err(err) => return Some(Err(SourceError::Decode(err))),
            };
            self.has_record = true;

            if self.pace {
                if let Some(offset_ms) = frame.t_ms {
                    self.pace_to(offset_ms).await;
                }
            }
            return Some(Ok(frame));
        }
    }
}

async fn open_lines(input: &ReplayInput) -> std::io::Result<LineReader> {
    let reader: Box<dyn AsyncBufRead + Unpin + Send> = match input {
        ReplayInput::Stdin => Box::new(BufReader::new(tokio::io::stdin())),
        ReplayInput::File(path) => Box::new(BufReader::new(tokio::fs::File::open(path).await?)),
        ReplayInput::Reader(name) => {
            return Err(std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                format!("replay reader {name} cannot be reopened"),
            ));
        }
    };
    Ok(reader.lines())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    async fn drain(source: &mut ReplaySource) -> Vec<Result<PoseFrame, SourceError>> {
        let mut out = Vec::new();
        while let Some(frame) = source.next_frame().await {
            out.push(frame);
        }
        out
    }

    #[tokio::test]
    async fn yields_frames_and_skips_blank_lines() {
        let data = "{\"hands\":[]}\n\n   \n{\"t_ms\":5}\n";
        let mut source = ReplaySource::from_reader(data.as_bytes(), "fixture", false);
        let frames = drain(&mut source).await;
        assert_eq!(frames.len(), 2);
        assert_eq!(frames[1].as_ref().unwrap().t_ms, Some(5));
    }

    #[tokio::test]
    async fn bad_line_is_a_single_failed_frame() {
        let data = "{\"hands\":[]}\nnot a frame\n{\"hands\":[]}\n";
        let mut source = ReplaySource::from_reader(data.as_bytes(), "fixture", false);
        let frames = drain(&mut source).await;
        assert_eq!(frames.len(), 3);
        assert!(frames[0].is_ok());
        assert!(matches!(frames[1], Err(SourceError::Decode(_))));
        assert!(frames[2].is_ok());
    }

    #[tokio::test(start_paused = true)]
    async fn paces_by_frame_offsets() {
        let data = "{\"t_ms\":1000}\n{\"t_ms\":1500}\n{\"t_ms\":1200}\n";
        let mut source = ReplaySource::from_reader(data.as_bytes(), "fixture", true);
        let start = time::Instant::now();
        drain(&mut source).await;
        // 1000 -> 1500 waits 500ms, going backwards does not wait
        assert_eq!(start.elapsed(), Duration::from_millis(500));
    }

    #[tokio::test]
    async fn loops_file_input() {
        let name = format!("gesture-replay-{}.jsonl", std::process::id());
        let path = std::env::temp_dir().join(name);
        {
            let mut file = std::fs::File::create(&path).unwrap();
            writeln!(file, "{{\"t_ms\":1}}").unwrap();
            writeln!(file, "{{\"t_ms\":2}}").unwrap();
        }

        let mut source = ReplaySource::open(ReplayInput::File(path.clone()), false, true)
            .await
            .unwrap();
        let mut offsets = Vec::new();
        for _ in 0..5 {
            let frame = source.next_frame().await.unwrap().unwrap();
            offsets.push(frame.t_ms.unwrap());
        }
        assert_eq!(offsets, vec![1, 2, 1, 2, 1]);
        let _ = std::fs::remove_file(path);
    }

    #[tokio::test]
    async fn reader_input_is_reported_by_name() {
        let mut source = ReplaySource::from_reader("{}\n".as_bytes(), "fixture", false);
        assert_eq!(source.input(), &ReplayInput::Reader("fixture".to_string()));
        assert_eq!(source.input().to_string(), "fixture");
        assert_eq!(drain(&mut source).await.len(), 1);

        let input = ReplayInput::Reader("fixture".into());
        let reopened = ReplaySource::open(input, false, false).await;
        assert!(reopened.is_err());
    }

    #[tokio::test]
    async fn missing_file_fails_to_open() {
        let path = std::env::temp_dir().join("gesture-replay-does-not-exist.jsonl");
        assert!(ReplaySource::open(ReplayInput::File(path), false, false)
            .await
            .is_err());
    }
}
