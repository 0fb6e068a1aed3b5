//! Optional speech-to-text input capability.
//!
//! # Responsibility
//! - Describe the "listen once, emit transcript" boundary.
//! - Probe for a usable recognizer at startup.
//!
//! # Invariants
//! - An absent capability is not an error.
//! - A recognizer only ever produces draft text; it never touches storage.

mod command;

pub use command::CommandRecognizer;

use log::info;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::{Path, PathBuf};

/// Locale the recognizer is configured for unless overridden.
pub const DEFAULT_LOCALE: &str = "ja-JP";

/// Fixed recognition settings handed to every listen call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecognitionConfig {
    pub locale: String,
    /// Keep listening after the first result.
    pub continuous: bool,
    /// Report partial hypotheses before the final result.
    pub interim_results: bool,
}

impl Default for RecognitionConfig {
    fn default() -> Self {
        Self {
            locale: DEFAULT_LOCALE.to_string(),
            continuous: false,
            interim_results: true,
        }
    }
}

/// One recognized utterance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transcript {
    pub text: String,
}

#[derive(Debug)]
pub enum SpeechError {
    /// The recognizer program could not be started.
    Spawn {
        program: PathBuf,
        source: std::io::Error,
    },
    /// Reading recognizer output failed.
    Io(std::io::Error),
    /// The recognizer exited unsuccessfully without a transcript.
    Exited(Option<i32>),
}

impl Display for SpeechError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Spawn { program, source } => {
                write!(f, "failed to start recognizer `{}`: {source}", program.display())
            }
            Self::Io(err) => write!(f, "failed to read recognizer output: {err}"),
            Self::Exited(Some(code)) => write!(f, "recognizer exited with status {code}"),
            Self::Exited(None) => write!(f, "recognizer terminated by signal"),
        }
    }
}

impl Error for SpeechError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Spawn { source, .. } => Some(source),
            Self::Io(err) => Some(err),
            Self::Exited(_) => None,
        }
    }
}

impl From<std::io::Error> for SpeechError {
    fn from(value: std::io::Error) -> Self {
        Self::Io(value)
    }
}

/// Listen-once speech capability.
pub trait SpeechRecognizer {
    /// Listens until the first recognized result, then stops.
    ///
    /// Returns `Ok(None)` when listening ended without any speech.
    fn listen_once(&mut self, config: &RecognitionConfig)
        -> Result<Option<Transcript>, SpeechError>;
}

/// Recognizer settings as read from configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpeechSettings {
    /// External program printing transcripts to stdout, one per line.
    pub command: Option<String>,
    /// Arguments; `{locale}`, `{continuous}` and `{interim}` are expanded per listen.
    pub args: Vec<String>,
    pub locale: Option<String>,
}

impl SpeechSettings {
    pub fn recognition_config(&self) -> RecognitionConfig {
        RecognitionConfig {
            locale: self
                .locale
                .clone()
                .unwrap_or_else(|| DEFAULT_LOCALE.to_string()),
            ..RecognitionConfig::default()
        }
    }
}

/// Queries the platform for a speech recognizer.
///
/// Returns `None` when no command is configured or the program cannot be
/// located.
pub fn detect_recognizer(settings: &SpeechSettings) -> Option<Box<dyn SpeechRecognizer>> {
    let command = settings.command.as_deref().map(str::trim).filter(|c| !c.is_empty())?;
    let Some(program) = resolve_program(command) else {
        info!("event=speech_probe module=speech status=unavailable reason=program_not_found");
        return None;
    };

    info!("event=speech_probe module=speech status=available");
    Some(Box::new(CommandRecognizer::new(program, settings.args.clone())))
}

fn resolve_program(command: &str) -> Option<PathBuf> {
    let candidate = Path::new(command);
    if candidate.components().count() > 1 {
        return candidate.is_file().then(|| candidate.to_path_buf());
    }

    std::env::var_os("PATH").and_then(|paths| {
        std::env::split_paths(&paths)
            .map(|dir| dir.join(command))
            .find(|path| path.is_file())
    })
}
