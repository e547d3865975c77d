//! Binary entrypoint that serves the summarizer HTTP API.

use std::process::ExitCode;

use insightmap::start_insightmap;

/// Start the server with configuration read from `INSIGHTMAP_*` variables.
fn main() -> ExitCode {
    start_insightmap::run()
}
