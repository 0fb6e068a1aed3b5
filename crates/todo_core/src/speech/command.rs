//! Recognizer backed by an external speech-to-text program.

use super::{RecognitionConfig, SpeechError, SpeechRecognizer, Transcript};
use log::{debug, warn};
use std::io::{BufRead, BufReader};
use std::path::PathBuf;
use std::process::{Child, Command, Stdio};

const LOCALE_PLACEHOLDER: &str = "{locale}";
const CONTINUOUS_PLACEHOLDER: &str = "{continuous}";
const INTERIM_PLACEHOLDER: &str = "{interim}";

/// Runs `program args..` and takes the first non-empty stdout line as the
/// transcript. The child is stopped as soon as that line arrives.
///
/// Arguments may carry `{locale}`, `{continuous}` and `{interim}`; the last
/// two expand to `true`/`false`. Output is decoded lossily, so a recognizer
/// writing a non-UTF-8 encoding still yields a transcript.
#[derive(Debug, Clone)]
pub struct CommandRecognizer {
    program: PathBuf,
    args: Vec<String>,
}

impl CommandRecognizer {
    pub fn new(program: impl Into<PathBuf>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
        }
    }

    fn expanded_args(&self, config: &RecognitionConfig) -> Vec<String> {
        let continuous = config.continuous.to_string();
        let interim = config.interim_results.to_string();
        self.args
            .iter()
            .map(|arg| {
                arg.replace(LOCALE_PLACEHOLDER, &config.locale)
                    .replace(CONTINUOUS_PLACEHOLDER, &continuous)
                    .replace(INTERIM_PLACEHOLDER, &interim)
            })
            .collect()
    }
}

/// Kills and reaps the recognizer on every exit path.
struct ListeningChild(Child);

impl Drop for ListeningChild {
    fn drop(&mut self) {
        if let Err(err) = self.0.kill() {
            debug!("event=speech_stop module=speech status=skipped error={err}");
        }
        let _ = self.0.wait();
    }
}

impl SpeechRecognizer for CommandRecognizer {
    fn listen_once(
        &mut self,
        config: &RecognitionConfig,
    ) -> Result<Option<Transcript>, SpeechError> {
        let child = Command::new(&self.program)
            .args(self.expanded_args(config))
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|source| SpeechError::Spawn {
                program: self.program.clone(),
                source,
            })?;
        let mut child = ListeningChild(child);

        let Some(stdout) = child.0.stdout.take() else {
            return Ok(None);
        };

        let mut reader = BufReader::new(stdout);
        let mut buf = Vec::new();
        loop {
            buf.clear();
            if reader.read_until(b'\n', &mut buf)? == 0 {
                break;
            }
            let line = String::from_utf8_lossy(&buf);
            let text = line.trim();
            if !text.is_empty() {
                // Non-continuous: the guard stops listening after the first result.
                return Ok(Some(Transcript {
                    text: text.to_string(),
                }));
            }
        }

        let status = child.0.wait()?;
        if status.success() {
            return Ok(None);
        }
        warn!(
            "event=speech_listen module=speech status=error exit_code={:?}",
            status.code()
        );
        Err(SpeechError::Exited(status.code()))
    }
}
