use std::fmt;
use tokio_util::codec::LinesCodecError;

#[derive(Debug)]
pub enum Error {
    Status(u16),
    Connect(String),
    Read(String),
    Handler(anyhow::Error),
}

impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        match err.status() {
            Some(status) => Error::Status(status.as_u16()),
            None         => Error::Connect(err.to_string()),
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::Read(err.to_string())
    }
}

impl From<LinesCodecError> for Error {
    fn from(err: LinesCodecError) -> Self {
        match err {
            LinesCodecError::MaxLineLengthExceeded => Error::Read("line too long".to_owned()),
            LinesCodecError::Io(e)                 => e.into(),
        }
    }
}

impl std::error::Error for Error {}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> Result<(), fmt::Error> {
        match self {
            Error::Status(code)  => write!(f, "stream status {}", code),
            Error::Connect(msg)  => write!(f, "stream connect: {}", msg),
            Error::Read(msg)     => write!(f, "stream read: {}", msg),
            Error::Handler(e)    => write!(f, "handler: {:#}", e),
        }
    }
}
