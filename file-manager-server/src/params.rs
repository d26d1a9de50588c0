use clap::Parser;

pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 32 * 1024 * 1024;

#[derive(Parser, Debug)]
#[clap(about = "Stores, serves and hashes files under a single directory")]
pub struct Args {
    /// Directory every uploaded file is written to.
    #[clap(long, env = "FILE_MANAGER_DATA_DIR")]
    pub(crate) data_dir: String,
    #[clap(long, env = "FILE_MANAGER_HTTP_ADDR", default_value = "127.0.0.1:8080")]
    pub(crate) http_addr: String,
    #[clap(long, env = "FILE_MANAGER_MAX_UPLOAD_BYTES", default_value_t = DEFAULT_MAX_UPLOAD_BYTES)]
    pub(crate) max_upload_bytes: usize,
}
