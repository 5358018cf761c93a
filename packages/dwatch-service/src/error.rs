pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error("Invalid configuration: {message}")]
	Config { message: String },
	#[error("Provider error: {message}")]
	Provider { message: String },
	#[error("Storage error: {message}")]
	Storage { message: String },
	#[error("Index error: {message}")]
	Index { message: String },
}
impl From<dwatch_providers::Error> for Error {
	fn from(err: dwatch_providers::Error) -> Self {
		match err {
			dwatch_providers::Error::InvalidConfig { message } => Self::Config { message },
			other => Self::Provider { message: other.to_string() },
		}
	}
}

impl From<dwatch_storage::Error> for Error {
	fn from(err: dwatch_storage::Error) -> Self {
		match err {
			dwatch_storage::Error::InvalidArgument(message) => Self::Config { message },
			dwatch_storage::Error::Reqwest(inner) => Self::Index { message: inner.to_string() },
			dwatch_storage::Error::Index(message) => Self::Index { message },
			other => Self::Storage { message: other.to_string() },
		}
	}
}
