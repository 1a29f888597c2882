// Copyright 2021-2024 SecureDNA Stiftung (SecureDNA Foundation) <licensing@securedna.org>
// SPDX-License-Identifier: MIT OR Apache-2.0

use clap::Parser;
use tracing::error;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::FmtSubscriber;

use ::annotator::shims::cli;
use ::annotator::shims::types::Opts;

#[tokio::main]
async fn main() {
    let opts = Opts::parse();

    // try_init also routes the `log` records from shared_types into tracing
    let subscriber = FmtSubscriber::builder()
        .with_writer(std::io::stderr)
        .with_max_level(opts.log_level())
        .finish();
    if let Err(e) = subscriber.try_init() {
        eprintln!("couldn't install log subscriber: {e}");
    }

    if let Err(err) = cli::run(opts).await {
        error!("{err:#}");
        std::process::exit(1);
    }
}
