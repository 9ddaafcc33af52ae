//! Bucketed size and age statistics for Amazon S3 buckets, as a CLI.
//!
//! This tool should be used from a command line; it walks the objects of
//! your buckets and writes a CSV report of their size, age, storage class,
//! extension and root folder repartition.
//!
//! Credentials must be provided via guidelines in the [AWS Documentation]
//! (https://docs.aws.amazon.com/cli/latest/userguide/cli-environment.html).
#[macro_use]
extern crate log as logger;

use rusoto_core::region::Region;

mod cli;
mod client;
mod log;
mod types;
mod walker;

mod report;

#[tokio::main]
async fn main() -> types::UtilResult<()> {
    // build the CLI and grab all arguments
    let args = cli::build().get_matches();

    // initialize logging
    log::init(&args)?;

    // create the default S3 client
    let s3 = client::connect(Region::default())?;

    // delegate to the cli mod
    cli::exec(s3, &args).await
}
