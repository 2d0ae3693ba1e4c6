use std::fmt;

#[derive(Debug)]
pub enum ConfigError {
    IoError(std::io::Error),
    TomlError(String),
    BadIPFormatting(String),
    DirectoryDoesNotExist(String),
    NotInRange(String),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::IoError(e) => write!(f, "IO error: {}", e),
            ConfigError::TomlError(e) => write!(f, "TOML parsing error: {}", e),
            ConfigError::BadIPFormatting(e) => write!(f, "IP formatting error: {}", e),
            ConfigError::DirectoryDoesNotExist(e) => write!(f, "Directory error: {}", e),
            ConfigError::NotInRange(e) => write!(f, "Value out of range: {}", e),
        }
    }
}

impl std::error::Error for ConfigError {}

impl From<std::io::Error> for ConfigError {
    fn from(err: std::io::Error) -> Self {
        ConfigError::IoError(err)
    }
}

/// Failure to turn an encoded payload into a frame.
#[derive(Debug)]
pub enum DecodeError {
    Base64(String),
    Image(String),
}

impl fmt::Display for DecodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DecodeError::Base64(e) => write!(f, "Invalid base64 payload: {}", e),
            DecodeError::Image(e) => write!(f, "Undecodable image: {}", e),
        }
    }
}

impl std::error::Error for DecodeError {}

#[derive(Debug)]
pub enum HandshakeError {
    MissingField(&'static str),
    MissingImage,
    Decode(DecodeError),
    NotUtf8,
}

impl fmt::Display for HandshakeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HandshakeError::MissingField(name) => write!(f, "Handshake is missing `{}`", name),
            HandshakeError::MissingImage => write!(f, "Handshake carries no ImageData"),
            HandshakeError::Decode(e) => write!(f, "Handshake frame error: {}", e),
            HandshakeError::NotUtf8 => write!(f, "Handshake is not valid UTF-8"),
        }
    }
}

impl std::error::Error for HandshakeError {}

impl From<DecodeError> for HandshakeError {
    fn from(err: DecodeError) -> Self {
        HandshakeError::Decode(err)
    }
}

#[derive(Debug)]
pub enum DetectorError {
    InferenceFailed(String),
    RemoteError(String),
    BadResponse(String),
    WorkerFailed(String),
}

impl fmt::Display for DetectorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DetectorError::InferenceFailed(e) => write!(f, "Tracker inference failed: {}", e),
            DetectorError::RemoteError(e) => write!(f, "Remote tracker error: {}", e),
            DetectorError::BadResponse(e) => write!(f, "Remote tracker response error: {}", e),
            DetectorError::WorkerFailed(e) => write!(f, "Detection worker failed: {}", e),
        }
    }
}

impl std::error::Error for DetectorError {}

#[derive(Debug)]
pub enum RecorderError {
    CreateFailed(std::io::Error),
    EncodeFailed(String),
    WriteFailed(std::io::Error),
}

impl fmt::Display for RecorderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecorderError::CreateFailed(e) => write!(f, "Video sink creation failed: {}", e),
            RecorderError::EncodeFailed(e) => write!(f, "Frame encoding failed: {}", e),
            RecorderError::WriteFailed(e) => write!(f, "Video sink write failed: {}", e),
        }
    }
}

impl std::error::Error for RecorderError {}

#[derive(Debug)]
pub enum TransportError {
    ReceiveFailed(String),
    Closed,
    IdleTimeout,
}

impl fmt::Display for TransportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransportError::ReceiveFailed(e) => write!(f, "Receive failed: {}", e),
            TransportError::Closed => write!(f, "Connection closed by peer"),
            TransportError::IdleTimeout => write!(f, "Connection idle timeout"),
        }
    }
}

impl std::error::Error for TransportError {}

/// Reasons a session never reaches streaming.
#[derive(Debug)]
pub enum SessionError {
    Handshake(HandshakeError),
    Tracker(DetectorError),
}

impl fmt::Display for SessionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionError::Handshake(e) => write!(f, "{}", e),
            SessionError::Tracker(e) => write!(f, "Session tracker unavailable: {}", e),
        }
    }
}

impl std::error::Error for SessionError {}

impl From<HandshakeError> for SessionError {
    fn from(err: HandshakeError) -> Self {
        SessionError::Handshake(err)
    }
}

impl From<DetectorError> for SessionError {
    fn from(err: DetectorError) -> Self {
        SessionError::Tracker(err)
    }
}

#[derive(Debug)]
pub enum ReportingError {
    RequestFailed(String),
    BadStatus(u16),
}

impl fmt::Display for ReportingError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReportingError::RequestFailed(e) => write!(f, "Backend request failed: {}", e),
            ReportingError::BadStatus(code) => write!(f, "Backend answered with status {}", code),
        }
    }
}

impl std::error::Error for ReportingError {}

#[derive(Debug)]
pub enum NetworkError {
    BindError(std::io::Error),
}

impl fmt::Display for NetworkError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NetworkError::BindError(e) => write!(f, "Network bind error: {}", e),
        }
    }
}

impl std::error::Error for NetworkError {}

#[derive(Debug)]
pub enum ControllerError {
    ConfigurationError(ConfigError),
    NetworkError(NetworkError),
    ReportingError(ReportingError),
}

impl fmt::Display for ControllerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ControllerError::ConfigurationError(e) => write!(f, "Configuration error: {}", e),
            ControllerError::NetworkError(e) => write!(f, "Network error: {}", e),
            ControllerError::ReportingError(e) => write!(f, "Reporting error: {}", e),
        }
    }
}

impl std::error::Error for ControllerError {}

impl From<NetworkError> for ControllerError {
    fn from(err: NetworkError) -> Self {
        ControllerError::NetworkError(err)
    }
}

impl From<ConfigError> for ControllerError {
    fn from(err: ConfigError) -> Self {
        ControllerError::ConfigurationError(err)
    }
}
