use clap::Parser;
use colored::Colorize;
use std::io::{self, Write};
use std::process::ExitCode;
use sysaudit::admin::{SystemRunner, run_task};
use sysaudit::cli::{AdminArgs, init_logging};
use sysaudit::config::AuditConfig;

fn main() -> ExitCode {
    let args = AdminArgs::parse();
    init_logging(args.verbose);

    let config = match AuditConfig::load(args.config.as_deref()) {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("{} {e}", "Error:".red());
            return ExitCode::FAILURE;
        }
    };

    let params = args.to_params(&config);
    let stdout = io::stdout();
    let mut out = stdout.lock();

    // External command failures are already reported inline
    if let Err(e) = run_task(args.task, &params, &SystemRunner, &mut out).and_then(|()| out.flush())
    {
        log::error!("failed to write output: {e}");
        return ExitCode::FAILURE;
    }
    ExitCode::SUCCESS
}
