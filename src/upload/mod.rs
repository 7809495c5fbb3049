//! FTP upload with bounded retries
//!
//! Each attempt opens a fresh session, deletes any previous copy of the
//! target, stores the file under the remote directory and lists the result.
//! Attempts are bounded by a deadline and retried up to a fixed count.

mod ftp;
mod retry;

pub use ftp::{server_address, FtpSession, FtpUploader, Reply};
pub use retry::{run_with_timeout, RetryPolicy, UploadJob, UploadOutcome, Uploader};
