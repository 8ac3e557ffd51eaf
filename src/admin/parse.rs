use regex::Regex;

const TASK_NAME: &str = r"(?m)^\s*TaskName:\s+(.+?)\s*$";
const NEXT_RUN: &str = r"(?m)^\s*Next Run Time:\s+(.+?)\s*$";

#[derive(Debug, Clone, PartialEq)]
pub struct ServiceState {
    pub name: String,
    pub status: String,
}

impl ServiceState {
    #[must_use]
    pub fn is_running(&self) -> bool {
        self.status.eq_ignore_ascii_case("running")
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ScheduledTask {
    pub name: String,
    pub next_run: String,
}

/// Parses `Get-Service | Select-Object Name,Status` table output.
#[must_use]
pub fn parse_services(output: &str) -> Vec<ServiceState> {
    output
        .lines()
        .filter_map(|line| {
            let parts: Vec<&str> = line.split_whitespace().collect();
            if parts.len() < 2 {
                return None;
            }
            let (name, status) = (parts[0], parts[parts.len() - 1]);

            if name == "Name" && status == "Status" {
                return None;
            }
            if parts.iter().all(|p| p.chars().all(|c| c == '-')) {
                return None;
            }

            Some(ServiceState {
                name: name.to_string(),
                status: status.to_string(),
            })
        })
        .collect()
}

/// Parses `schtasks /query /fo LIST /v` output into one entry per block that
/// carries both a task name and a next run time.
pub fn parse_scheduled_tasks(output: &str) -> Result<Vec<ScheduledTask>, regex::Error> {
    let name_re = Regex::new(TASK_NAME)?;
    let next_re = Regex::new(NEXT_RUN)?;

    let normalized = output.replace("\r\n", "\n");

    let tasks = normalized
        .split("\n\n")
        .filter(|block| !block.trim().is_empty())
        .filter_map(|block| {
            let name = name_re.captures(block)?.get(1)?.as_str();
            let next_run = next_re.captures(block)?.get(1)?.as_str();
            Some(ScheduledTask {
                name: name.to_string(),
                next_run: next_run.to_string(),
            })
        })
        .collect();
    Ok(tasks)
}

#[must_use]
pub fn is_vendor_task(name: &str, prefix: &str) -> bool {
    name.to_lowercase().starts_with(&prefix.to_lowercase())
}

/// Trimmed command output, or `None` when there is nothing to show.
#[must_use]
pub fn non_empty(output: &str) -> Option<&str> {
    let trimmed = output.trim();
    (!trimmed.is_empty()).then_some(trimmed)
}
