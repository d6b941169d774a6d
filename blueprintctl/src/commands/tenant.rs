use crate::commands::Context;
use crate::output::{self, OutputFormat};
use crate::TenantCommands;
use anyhow::Result;
use blueprintctl::lifecycle::{self, CreateRequest};
use blueprintctl::registry;
use blueprintctl::render::TENANT_MANIFEST_FILE;

pub fn handle_tenant_command(command: TenantCommands, ctx: &Context) -> Result<()> {
    match command {
        TenantCommands::Create {
            name,
            plan,
            repo,
            domain,
            email,
            dry_run,
        } => {
            let request = CreateRequest {
                name,
                plan,
                repo_url: repo,
                domain,
                email,
            };
            let report = lifecycle::create(&ctx.repo_root, &request, dry_run)?;
            let tenant = &report.tenant;

            if ctx.format != OutputFormat::Table {
                output::print_single(&report, ctx.format)?;
            } else if report.dry_run {
                println!(
                    "=== DRY RUN: tenant '{}' (plan: {}) ===",
                    tenant.name(),
                    tenant.plan().name
                );
                println!("Output dir: {}", report.tenant_dir.display());
                println!("Namespace:  {}", tenant.namespace());
                println!("Domain:     {}", tenant.domain());
                println!("Repo:       {}", tenant.repo_url());
                println!("Contact:    {}", tenant.email());
                println!("\nFiles that would be written:");
                for file in &report.files {
                    println!("  {}", file.display());
                }
            } else {
                output::print_created("Tenant", tenant.name(), &report.tenant_dir.display().to_string());
                if !ctx.auto_push {
                    println!("\nNext steps:");
                    println!("  1. git add tenants/{}", tenant.namespace());
                    println!(
                        "  2. git commit -m 'feat: onboard tenant {}'",
                        tenant.name()
                    );
                    println!("  3. git push");
                }
                println!("ArgoCD syncs the new tenant automatically after the push.");
                println!("Tenant portal: {}", tenant.portal_url());
            }

            if !report.dry_run {
                ctx.publish(&format!(
                    "feat: onboard tenant {} (plan: {})",
                    tenant.name(),
                    tenant.plan().name
                ))?;
            }
        }
        TenantCommands::List => {
            let tenants = registry::tenant_summaries(&ctx.repo_root)?;

            if tenants.is_empty() && ctx.format == OutputFormat::Table {
                output::print_info("No tenants yet");
                println!("Create one with: blueprintctl tenant create --help");
                return Ok(());
            }
            output::print_output(tenants, ctx.format)?;
        }
        TenantCommands::Delete { name, force } => {
            let dir = lifecycle::delete(&ctx.repo_root, &name, force)?;
            output::print_deleted("Tenant", &name);
            println!("   removed {}", dir.display());
            if !ctx.auto_push {
                println!("   Commit and push so ArgoCD removes the tenant's resources from the cluster.");
            }
            ctx.publish(&format!("chore: offboard tenant {}", name))?;
        }
        TenantCommands::Sync { name } => {
            let report = lifecycle::sync(&ctx.repo_root, &name)?;

            if ctx.format != OutputFormat::Table {
                output::print_single(&report, ctx.format)?;
            } else {
                output::print_success(&format!(
                    "Tenant '{}' re-rendered from {}",
                    name,
                    report.tenant_dir.join(TENANT_MANIFEST_FILE).display()
                ));
                if !ctx.auto_push {
                    println!("   Commit and push to apply the changes.");
                }
            }
            ctx.publish(&format!("chore: sync tenant {}", name))?;
        }
    }
    Ok(())
}
