use crate::commands::Context;
use crate::output::{self, OutputFormat};
use crate::PlanCommands;
use anyhow::Result;
use blueprint_common::plans::{self, Plan};
use serde::Serialize;
use tabled::Tabled;

#[derive(Debug, Serialize, Tabled)]
struct PlanRow {
    #[tabled(rename = "PLAN")]
    name: &'static str,
    #[tabled(rename = "CPU_REQ")]
    cpu_requests: String,
    #[tabled(rename = "CPU_LIM")]
    cpu_limits: String,
    #[tabled(rename = "MEM_REQ")]
    memory_requests: String,
    #[tabled(rename = "MEM_LIM")]
    memory_limits: String,
    #[tabled(rename = "PODS")]
    max_pods: u32,
    #[tabled(rename = "STORAGE")]
    max_storage: String,
}

impl From<&Plan> for PlanRow {
    fn from(plan: &Plan) -> Self {
        let q = &plan.quota;
        Self {
            name: plan.name,
            cpu_requests: q.cpu_requests.to_string(),
            cpu_limits: q.cpu_limits.to_string(),
            memory_requests: q.memory_requests.to_string(),
            memory_limits: q.memory_limits.to_string(),
            max_pods: q.max_pods,
            max_storage: q.max_storage.to_string(),
        }
    }
}

pub fn handle_plan_command(command: PlanCommands, ctx: &Context) -> Result<()> {
    match command {
        PlanCommands::List => {
            if ctx.format == OutputFormat::Table {
                let rows: Vec<PlanRow> = plans::plans().map(PlanRow::from).collect();
                output::print_table(rows);
            } else {
                let all: Vec<&Plan> = plans::plans().collect();
                output::print_single(&all, ctx.format)?;
            }
        }
    }
    Ok(())
}
