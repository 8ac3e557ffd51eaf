mod parse;
mod runner;

pub use parse::{
    ScheduledTask, ServiceState, is_vendor_task, parse_scheduled_tasks, parse_services,
};
pub use runner::{CommandRunner, SystemRunner, powershell_script, run_powershell};

use chrono::{DateTime, Local, NaiveDateTime, TimeDelta};
use clap::ValueEnum;
use colored::Colorize;
use comfy_table::Table;
use std::io::{self, Write};

pub const DEFAULT_EXCLUDE_PREFIX: &str = r"\Microsoft";
pub const DEFAULT_MAX_EVENTS: u32 = 5;

const SERVICES_SCRIPT: &str = "Get-Service | Select-Object -Property Name,Status";
const STARTUP_SCRIPT: &str = "Get-CimInstance -ClassName Win32_StartupCommand | Select-Object Name,Command | Format-Table -AutoSize";
const FIREWALL_SCRIPT: &str = "Get-NetFirewallRule -Direction Inbound | Where-Object {($_ | Get-NetFirewallAddressFilter).RemoteAddress -eq '0.0.0.0/0'} | Get-NetFirewallRule | Select-Object DisplayName";

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum AdminTask {
    #[value(alias = "win-services")]
    ServiceStatus,
    #[value(alias = "win-events")]
    RecentEvents,
    #[value(alias = "win-startup")]
    StartupItems,
    #[value(alias = "win-firewall")]
    FirewallRules,
    #[value(alias = "win-tasks")]
    ScheduledTasks,
}

impl AdminTask {
    #[must_use]
    pub fn title(self) -> &'static str {
        match self {
            Self::ServiceStatus => "🩺 Service status",
            Self::RecentEvents => "📅 Recent System Events",
            Self::StartupItems => "🚀 Startup Items",
            Self::FirewallRules => "🔥 Firewall Rules allowing inbound 0.0.0.0/0",
            Self::ScheduledTasks => "⏰ Scheduled Tasks (non-Microsoft)",
        }
    }
}

#[derive(Debug, Clone)]
pub struct TaskParams {
    /// Services to check; empty means list all
    pub watch: Vec<String>,
    /// Start watched services that are not running
    pub fix: bool,
    /// Only events newer than this many hours
    pub hours: Option<u32>,
    pub max_events: u32,
    pub exclude_prefix: String,
}

impl Default for TaskParams {
    fn default() -> Self {
        Self {
            watch: Vec::new(),
            fix: false,
            hours: None,
            max_events: DEFAULT_MAX_EVENTS,
            exclude_prefix: DEFAULT_EXCLUDE_PREFIX.to_string(),
        }
    }
}

/// Runs one task and writes its output. Command failures become a diagnostic
/// line; only errors writing to `out` are returned.
pub fn run_task(
    task: AdminTask,
    params: &TaskParams,
    runner: &impl CommandRunner,
    out: &mut impl Write,
) -> io::Result<()> {
    log::info!("running admin task {task:?}");

    match task {
        AdminTask::ServiceStatus => service_status(params, runner, out),
        AdminTask::RecentEvents => {
            let since = match params.hours {
                None => None,
                Some(h) => match event_window_start(Local::now(), h) {
                    Some(t) => Some(t),
                    None => {
                        writeln!(out, "{}", task.title().bold())?;
                        let reason = format!("a window of {h} hours is out of range");
                        return report_failure(out, "getting events", &reason);
                    }
                },
            };
            recent_events(params.max_events, since, runner, out)
        }
        AdminTask::StartupItems => {
            writeln!(out, "{}", task.title().bold())?;
            match run_powershell(runner, STARTUP_SCRIPT) {
                Ok(text) => match parse::non_empty(&text) {
                    Some(items) => writeln!(out, "{items}"),
                    None => writeln!(out, "No startup items found."),
                },
                Err(e) => report_failure(out, "getting startup items", &e),
            }
        }
        AdminTask::FirewallRules => {
            writeln!(out, "{}", task.title().bold())?;
            match run_powershell(runner, FIREWALL_SCRIPT) {
                Ok(text) => match parse::non_empty(&text) {
                    Some(rules) => writeln!(out, "{rules}"),
                    None => writeln!(out, "No inbound firewall rules found allowing 0.0.0.0/0."),
                },
                Err(e) => report_failure(out, "getting firewall rules", &e),
            }
        }
        AdminTask::ScheduledTasks => scheduled_tasks(&params.exclude_prefix, runner, out),
    }
}

fn report_failure(
    out: &mut impl Write,
    doing: &str,
    err: &dyn std::fmt::Display,
) -> io::Result<()> {
    log::warn!("{doing} failed: {err}");
    writeln!(out, "{}", format!("❌ Error {doing}: {err}").red())
}

fn service_status(
    params: &TaskParams,
    runner: &impl CommandRunner,
    out: &mut impl Write,
) -> io::Result<()> {
    writeln!(out, "{}", AdminTask::ServiceStatus.title().bold())?;

    let services = match run_powershell(runner, SERVICES_SCRIPT) {
        Ok(text) => parse_services(&text),
        Err(e) => return report_failure(out, "getting services", &e),
    };

    let watched: Vec<&ServiceState> = if params.watch.is_empty() {
        services.iter().collect()
    } else {
        services
            .iter()
            .filter(|s| params.watch.iter().any(|w| w.eq_ignore_ascii_case(&s.name)))
            .collect()
    };

    let mut table = Table::new();
    table.load_preset(comfy_table::presets::NOTHING);
    for s in &watched {
        table.add_row(vec![s.name.as_str(), s.status.as_str()]);
    }
    if table.row_count() > 0 {
        writeln!(out, "{table}")?;
    }

    for name in &params.watch {
        if !services.iter().any(|s| s.name.eq_ignore_ascii_case(name)) {
            writeln!(out, "{}", format!("{name}: not found").yellow())?;
        }
    }

    if !params.fix {
        return Ok(());
    }

    for s in watched.iter().filter(|s| !params.watch.is_empty() && !s.is_running()) {
        let script = format!("Start-Service -Name '{}'", s.name.replace('\'', "''"));
        match run_powershell(runner, &script) {
            Ok(_) => writeln!(out, "{} {}", "Started".green(), s.name)?,
            Err(e) => report_failure(out, &format!("starting {}", s.name), &e)?,
        }
    }
    Ok(())
}

/// Start of an event window reaching `hours` back from `now`, or `None` when
/// that falls outside the representable date range.
#[must_use]
pub fn event_window_start(now: DateTime<Local>, hours: u32) -> Option<NaiveDateTime> {
    let span = TimeDelta::try_hours(i64::from(hours))?;
    now.checked_sub_signed(span).map(|t| t.naive_local())
}

#[must_use]
pub fn events_script(max_events: u32, since: Option<NaiveDateTime>) -> String {
    match since {
        Some(t) => format!(
            "Get-WinEvent -FilterHashtable @{{LogName='System'; StartTime=[datetime]'{}'}} -MaxEvents {} | Format-List TimeCreated,Message",
            t.format("%Y-%m-%dT%H:%M:%S"),
            max_events
        ),
        None => format!(
            "Get-WinEvent -LogName System -MaxEvents {max_events} | Format-List TimeCreated,Message"
        ),
    }
}

fn recent_events(
    max_events: u32,
    since: Option<NaiveDateTime>,
    runner: &impl CommandRunner,
    out: &mut impl Write,
) -> io::Result<()> {
    match since {
        Some(t) => writeln!(
            out,
            "{}",
            format!(
                "{} (up to {max_events}, since {})",
                AdminTask::RecentEvents.title(),
                t.format("%Y-%m-%d %H:%M")
            )
            .bold()
        )?,
        None => writeln!(
            out,
            "{}",
            format!("{} (Last {max_events})", AdminTask::RecentEvents.title()).bold()
        )?,
    }

    let script = events_script(max_events, since);
    match run_powershell(runner, &script) {
        Ok(text) => match parse::non_empty(&text) {
            Some(events) => writeln!(out, "{events}"),
            None => writeln!(out, "No events found."),
        },
        Err(e) => report_failure(out, "getting events", &e),
    }
}

fn scheduled_tasks(
    exclude_prefix: &str,
    runner: &impl CommandRunner,
    out: &mut impl Write,
) -> io::Result<()> {
    writeln!(out, "{}", AdminTask::ScheduledTasks.title().bold())?;

    let text = match runner.run("schtasks", &["/query", "/fo", "LIST", "/v"]) {
        Ok(text) => text,
        Err(e) => {
            log::warn!("schtasks failed: {e}");
            return writeln!(
                out,
                "{}",
                "❌ Failed to query scheduled tasks. Try running as administrator.".red()
            );
        }
    };

    let parsed = match parse_scheduled_tasks(&text) {
        Ok(parsed) => parsed,
        Err(e) => return report_failure(out, "parsing scheduled tasks", &e),
    };
    let tasks: Vec<ScheduledTask> = parsed
        .into_iter()
        .filter(|t| !is_vendor_task(&t.name, exclude_prefix))
        .collect();

    if tasks.is_empty() {
        return writeln!(out, "No non-Microsoft scheduled tasks found.");
    }

    let mut table = Table::new();
    table.load_preset(comfy_table::presets::NOTHING);
    table.set_header(vec!["Task", "Next Run"]);
    for t in &tasks {
        table.add_row(vec![t.name.as_str(), t.next_run.as_str()]);
    }
    writeln!(out, "{table}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ExternalCommandError;
    use std::cell::RefCell;

    /// Answers each call with the first canned response whose needle occurs in
    /// the command line.
    struct FakeRunner {
        responses: Vec<(&'static str, Result<&'static str, &'static str>)>,
        calls: RefCell<Vec<String>>,
    }

    impl FakeRunner {
        fn new(responses: Vec<(&'static str, Result<&'static str, &'static str>)>) -> Self {
            Self {
                responses,
                calls: RefCell::new(Vec::new()),
            }
        }
    }

    impl CommandRunner for FakeRunner {
        fn run(&self, program: &str, args: &[&str]) -> Result<String, ExternalCommandError> {
            let line = format!("{program} {}", args.join(" "));
            self.calls.borrow_mut().push(line.clone());
            let (_, response) = self
                .responses
                .iter()
                .find(|(needle, _)| line.contains(needle))
                .unwrap_or_else(|| panic!("unexpected command: {line}"));
            match response {
                Ok(stdout) => Ok((*stdout).to_string()),
                Err(stderr) => Err(ExternalCommandError::Failed {
                    program: program.to_string(),
                    status: "exit status: 1".to_string(),
                    stderr: (*stderr).to_string(),
                }),
            }
        }
    }

    const SERVICES: &str = "
Name                 Status
----                 ------
Spooler             Stopped
W32Time             Running
wuauserv            Stopped
";

    fn run(task: AdminTask, params: &TaskParams, runner: &FakeRunner) -> String {
        colored::control::set_override(false);
        let mut buf = Vec::new();
        run_task(task, params, runner, &mut buf).unwrap();
        String::from_utf8(buf).unwrap()
    }

    #[test]
    fn test_service_status_lists_all() {
        let runner = FakeRunner::new(vec![("Get-Service", Ok(SERVICES))]);
        let text = run(AdminTask::ServiceStatus, &TaskParams::default(), &runner);

        assert!(text.starts_with("🩺 Service status"));
        assert!(text.contains("Spooler"));
        assert!(text.contains("W32Time"));
        assert!(text.contains("Running"));
        assert_eq!(runner.calls.borrow().len(), 1);
    }

    #[test]
    fn test_service_status_watch_and_fix() {
        let runner = FakeRunner::new(vec![
            ("Get-Service", Ok(SERVICES)),
            ("Start-Service -Name 'Spooler'", Ok("")),
            ("Start-Service -Name 'wuauserv'", Err("Access is denied.")),
        ]);
        let params = TaskParams {
            watch: ["spooler", "W32Time", "wuauserv", "Ghost"]
                .iter()
                .map(|s| (*s).to_string())
                .collect(),
            fix: true,
            ..TaskParams::default()
        };
        let text = run(AdminTask::ServiceStatus, &params, &runner);

        assert!(text.contains("Started Spooler"));
        assert!(text.contains("❌ Error starting wuauserv"));
        assert!(text.contains("Access is denied."));
        assert!(text.contains("Ghost: not found"));
        // W32Time already running
        let calls = runner.calls.borrow();
        assert_eq!(calls.len(), 3);
        assert!(!calls.iter().any(|c| c.contains("W32Time")));
    }

    #[test]
    fn test_service_status_without_fix_starts_nothing() {
        let runner = FakeRunner::new(vec![("Get-Service", Ok(SERVICES))]);
        let params = TaskParams {
            watch: vec!["Spooler".to_string()],
            ..TaskParams::default()
        };
        let text = run(AdminTask::ServiceStatus, &params, &runner);

        assert!(text.contains("Spooler"));
        assert!(!text.contains("wuauserv"));
        assert_eq!(runner.calls.borrow().len(), 1);
    }

    #[test]
    fn test_command_failure_is_reported() {
        let runner = FakeRunner::new(vec![("Get-Service", Err("not recognized"))]);
        let text = run(AdminTask::ServiceStatus, &TaskParams::default(), &runner);

        assert!(text.contains("❌ Error getting services"));
        assert!(text.contains("not recognized"));
    }

    #[test]
    fn test_events_script() {
        assert_eq!(
            events_script(5, None),
            "Get-WinEvent -LogName System -MaxEvents 5 | Format-List TimeCreated,Message"
        );

        let since =
            NaiveDateTime::parse_from_str("2026-10-19 08:30:00", "%Y-%m-%d %H:%M:%S").unwrap();
        let script = events_script(20, Some(since));
        assert!(script.contains("StartTime=[datetime]'2026-10-19T08:30:00'"));
        assert!(script.contains("-MaxEvents 20"));
    }

    #[test]
    fn test_recent_events_with_window() {
        let runner = FakeRunner::new(vec![(
            "FilterHashtable",
            Ok("TimeCreated : today\r\nMessage : ok\r\n"),
        )]);
        let params = TaskParams {
            hours: Some(12),
            ..TaskParams::default()
        };
        let text = run(AdminTask::RecentEvents, &params, &runner);

        assert!(text.contains("since"));
        assert!(text.contains("Message : ok"));
    }

    #[test]
    fn test_event_window_start() {
        let now = Local::now();
        let start = event_window_start(now, 12).unwrap();
        assert_eq!(start, (now - TimeDelta::hours(12)).naive_local());
        assert!(event_window_start(now, u32::MAX).is_none());
    }

    #[test]
    fn test_recent_events_huge_window_is_reported() {
        let runner = FakeRunner::new(vec![]);
        let params = TaskParams {
            hours: Some(3_000_000_000),
            ..TaskParams::default()
        };
        let text = run(AdminTask::RecentEvents, &params, &runner);

        assert!(text.contains("❌ Error getting events"));
        assert!(text.contains("out of range"));
        assert!(runner.calls.borrow().is_empty());
    }

    #[test]
    fn test_powershell_output_is_utf8() {
        let runner = FakeRunner::new(vec![("Win32_StartupCommand", Ok("Überwachung"))]);
        let text = run(AdminTask::StartupItems, &TaskParams::default(), &runner);

        assert!(text.contains("Überwachung"));
        let calls = runner.calls.borrow();
        assert!(calls[0].contains("[Console]::OutputEncoding = [Text.Encoding]::UTF8;"));
    }

    #[test]
    fn test_recent_events_empty() {
        let runner = FakeRunner::new(vec![("Get-WinEvent -LogName System -MaxEvents 5", Ok("\r\n"))]);
        let text = run(AdminTask::RecentEvents, &TaskParams::default(), &runner);
        assert!(text.contains("(Last 5)"));
        assert!(text.contains("No events found."));
    }

    #[test]
    fn test_startup_items_passthrough() {
        let runner = FakeRunner::new(vec![(
            "Win32_StartupCommand",
            Ok("\r\nName  Command\r\n----  -------\r\nSync  sync.exe\r\n\r\n"),
        )]);
        let text = run(AdminTask::StartupItems, &TaskParams::default(), &runner);
        assert!(text.contains("Sync  sync.exe"));
    }

    #[test]
    fn test_firewall_rules_none() {
        let runner = FakeRunner::new(vec![("Get-NetFirewallRule", Ok("   \r\n"))]);
        let text = run(AdminTask::FirewallRules, &TaskParams::default(), &runner);
        assert!(text.contains("No inbound firewall rules found allowing 0.0.0.0/0."));
    }

    #[test]
    fn test_scheduled_tasks_excludes_vendor_prefix() {
        let output = "TaskName: \\Microsoft\\Windows\\Defrag\r\nNext Run Time: N/A\r\n\r\n\
TaskName: \\BackupJob\r\nNext Run Time: 10/20/2026 2:00:00 AM\r\n";
        let runner = FakeRunner::new(vec![("schtasks /query /fo LIST /v", Ok(output))]);
        let text = run(AdminTask::ScheduledTasks, &TaskParams::default(), &runner);

        assert!(text.contains("\\BackupJob"));
        assert!(text.contains("10/20/2026 2:00:00 AM"));
        assert!(!text.contains("Defrag"));
    }

    #[test]
    fn test_scheduled_tasks_only_vendor() {
        let output = "TaskName: \\Microsoft\\A\nNext Run Time: N/A\n";
        let runner = FakeRunner::new(vec![("schtasks", Ok(output))]);
        let text = run(AdminTask::ScheduledTasks, &TaskParams::default(), &runner);
        assert!(text.contains("No non-Microsoft scheduled tasks found."));
    }

    #[test]
    fn test_scheduled_tasks_failure() {
        let runner = FakeRunner::new(vec![("schtasks", Err("ERROR: Access denied"))]);
        let text = run(AdminTask::ScheduledTasks, &TaskParams::default(), &runner);
        assert!(text.contains("Try running as administrator."));
    }

    #[test]
    fn test_task_aliases() {
        assert_eq!(
            AdminTask::from_str("win-tasks", false).unwrap(),
            AdminTask::ScheduledTasks
        );
        assert_eq!(
            AdminTask::from_str("service-status", false).unwrap(),
            AdminTask::ServiceStatus
        );
    }
}
