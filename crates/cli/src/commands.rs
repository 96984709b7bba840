use ferrous_filters_domain::{Filter, FilterId, GroupId};

use crate::di::UseCases;

pub async fn list(use_cases: &UseCases) -> anyhow::Result<()> {
    let groups = use_cases.get_filters.groups().await?;
    let filters = use_cases.get_filters.execute().await?;

    for group in &groups {
        let members: Vec<&Filter> = filters
            .iter()
            .filter(|f| f.group_id == group.group_id)
            .collect();
        if members.is_empty() {
            continue;
        }
        println!(
            "[{}] {} ({})",
            group.group_id,
            group.name,
            if group.is_enabled() { "enabled" } else { "disabled" }
        );
        for filter in members {
            println!("  {}", format_filter(filter));
        }
    }
    Ok(())
}

fn format_filter(filter: &Filter) -> String {
    let mut flags = Vec::new();
    if filter.is_enabled() {
        flags.push("enabled");
    }
    if filter.is_installed() {
        flags.push("installed");
    }
    if filter.is_custom() && filter.is_trusted() {
        flags.push("trusted");
    }
    format!(
        "{:>5}  {:<40} v{:<12} {}",
        filter.id,
        filter.metadata.name,
        filter.version.version,
        flags.join(",")
    )
}

pub async fn set_enabled(use_cases: &UseCases, ids: &[FilterId], enabled: bool) -> anyhow::Result<()> {
    use_cases.set_filters_enabled.execute(ids, enabled).await?;
    println!(
        "{} {} filter(s)",
        if enabled { "Enabled" } else { "Disabled" },
        ids.len()
    );
    Ok(())
}

pub async fn set_group_enabled(use_cases: &UseCases, id: GroupId, enabled: bool) -> anyhow::Result<()> {
    use_cases.set_group_enabled.execute(id, enabled).await?;
    println!(
        "{} group {}",
        if enabled { "Enabled" } else { "Disabled" },
        id
    );
    Ok(())
}

pub async fn add_custom(
    use_cases: &UseCases,
    url: &str,
    title: Option<&str>,
    trusted: bool,
) -> anyhow::Result<()> {
    let filter = use_cases.add_custom_filter.execute(url, title, trusted).await?;
    println!("Subscribed: {}", format_filter(&filter));
    Ok(())
}

pub async fn remove_custom(use_cases: &UseCases, id: FilterId) -> anyhow::Result<()> {
    use_cases.remove_custom_filter.execute(id).await?;
    println!("Removed custom filter {}", id);
    Ok(())
}

pub async fn show_user_rules(use_cases: &UseCases) -> anyhow::Result<()> {
    for rule in use_cases.user_rules.get().await? {
        println!("{}", rule);
    }
    Ok(())
}

pub async fn check_updates(use_cases: &UseCases) -> anyhow::Result<()> {
    let outcome = use_cases.force_update_check.execute().await?;
    println!(
        "Checked {}, updated {}, failed {}",
        outcome.checked.len(),
        outcome.updated.len(),
        outcome.failed.len()
    );
    for id in &outcome.failed {
        println!("  failed: {}", id);
    }
    Ok(())
}
