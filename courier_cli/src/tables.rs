use comfy_table::Table;
use courier_optimizer::{
    problem::network_state::NetworkState,
    solver::{
        recovery::failure_recovery::RecoveryReport, schedule::scheduler::ScheduleReport,
        statistics::NetworkStatistics,
    },
};

pub fn schedule_table(report: &ScheduleReport) -> Table {
    let mut table = Table::new();
    table.set_header(vec![
        "Day",
        "Considered",
        "Assigned",
        "Delivered",
        "Delivered total",
        "Violations",
    ]);
    for day in &report.days {
        table.add_row(vec![
            day.day.to_string(),
            day.considered.to_string(),
            day.assigned.to_string(),
            day.delivered.to_string(),
            day.delivered_total.to_string(),
            day.violations.to_string(),
        ]);
    }
    table
}

/// One row per vehicle with its load and current route.
pub fn fleet_table(state: &NetworkState) -> Table {
    let mut table = Table::new();
    table.set_header(vec![
        "Vehicle", "Class", "Location", "Packages", "Load (kg)", "Battery", "Route cost",
        "Route time (h)",
    ]);
    for (index, vehicle) in state.vehicle_indices().zip(state.vehicles()) {
        let packages = state.assigned_packages(index).map_or(0, |packages| packages.len());
        let route = state.route(index).ok().flatten();
        table.add_row(vec![
            if vehicle.external_id().is_empty() {
                index.to_string()
            } else {
                vehicle.external_id().to_owned()
            },
            vehicle.class().as_str().to_owned(),
            vehicle.current_location().to_string(),
            packages.to_string(),
            format!("{:.1}/{:.1}", vehicle.load().weight, vehicle.weight_capacity()),
            format!(
                "{:.1}/{:.1}",
                vehicle.current_battery(),
                vehicle.battery_capacity()
            ),
            route.map_or_else(|| String::from("-"), |route| format!("{:.2}", route.total_cost())),
            route.map_or_else(|| String::from("-"), |route| format!("{:.2}", route.total_time())),
        ]);
    }
    table
}

pub fn recovery_table(report: &RecoveryReport) -> Table {
    let join = |values: Vec<String>| {
        if values.is_empty() {
            String::from("-")
        } else {
            values.join(", ")
        }
    };

    let mut table = Table::new();
    table.set_header(vec!["", "Value"]);
    table.add_row(vec![
        String::from("Substitute"),
        report
            .substitute
            .map_or_else(|| String::from("-"), |node| node.to_string()),
    ]);
    for (label, packages) in [
        ("Affected", &report.affected),
        ("Reassigned", &report.reassigned),
        ("Unassigned", &report.unassigned),
    ] {
        table.add_row(vec![
            String::from(label),
            join(packages.iter().map(|package| package.to_string()).collect()),
        ]);
    }
    table.add_row(vec![
        String::from("Replanned vehicles"),
        join(
            report
                .replanned_vehicles
                .iter()
                .map(|vehicle| vehicle.to_string())
                .collect(),
        ),
    ]);
    table
}

pub fn statistics_table(statistics: &NetworkStatistics) -> Table {
    let mut table = Table::new();
    table.set_header(vec!["Statistic", "Value"]);
    table.add_row(vec![
        String::from("Delivered packages"),
        statistics.delivered_packages.to_string(),
    ]);
    table.add_row(vec![
        String::from("Active vehicles"),
        statistics.active_vehicles.to_string(),
    ]);
    table.add_row(vec![
        String::from("Average delivery time (min)"),
        format!("{:.1}", statistics.average_delivery_time),
    ]);
    table.add_row(vec![
        String::from("Network efficiency (%)"),
        format!("{:.1}", statistics.network_efficiency),
    ]);
    table
}
