//! Errors the uploader's socket I/O and wire protocol can raise.

/// Failures from [`crate::upload`].
#[derive(Debug, thiserror::Error)]
pub enum UploadError {
	/// Socket setup or send/receive failed.
	#[error("socket I/O error: {0}")]
	Io(#[from] std::io::Error),
	/// The controller NACKed a chunk past the first, or backoff on the
	/// first chunk was exhausted.
	#[error("checksum rejected by controller after {attempts} attempt(s)")]
	ChecksumRejected {
		/// Number of send attempts made for the failing chunk.
		attempts: u32,
	},
	/// No reply was observed within the configured network timeout.
	#[error("controller did not reply within the network timeout")]
	Timeout,
	/// The controller replied with a byte that is neither ACK nor NACK.
	#[error("unexpected reply byte {0:#04x}")]
	UnexpectedReply(u8),
}
