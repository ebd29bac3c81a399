//! CLI module for quarterclose
//!
//! Provides command-line interface for:
//! - init: Create directory structure
//! - serve: Answer JSON requests on stdin until EOF
//! - exec: Answer one JSON request

mod args;
mod commands;
mod config;
mod errors;
mod handler;
mod io;
mod request;
mod response;

pub use args::{Cli, Command};
pub use commands::{exec, init, open_handler, run, run_command, serve};
pub use config::Config;
pub use errors::{CliError, CliResult};
pub use handler::RequestHandler;
pub use io::{read_request, read_requests, write_error, write_json, write_response};
pub use request::Request;
pub use response::Response;
