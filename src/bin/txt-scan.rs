use clap::Parser;
use colored::Colorize;
use std::io::{self, Write};
use std::process::ExitCode;
use sysaudit::cli::{ScanArgs, init_logging};
use sysaudit::config::AuditConfig;
use sysaudit::{report, scanner};

fn main() -> ExitCode {
    let args = ScanArgs::parse();
    init_logging(args.verbose);

    let config = match AuditConfig::load(args.config.as_deref()) {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("{} {e}", "Error:".red());
            return ExitCode::FAILURE;
        }
    };

    let request = args.to_request(&config);
    let stdout = io::stdout();
    let mut out = stdout.lock();

    let (written, code) = match scanner::scan(&request) {
        Ok(scan_report) => (
            report::render_report(&scan_report, &mut out),
            ExitCode::SUCCESS,
        ),
        Err(e) => (report::render_error(&e, &mut out), ExitCode::FAILURE),
    };

    if let Err(e) = written.and_then(|()| out.flush()) {
        log::error!("failed to write report: {e}");
        return ExitCode::FAILURE;
    }
    code
}
