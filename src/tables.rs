use chrono::NaiveDateTime;
use comfy_table::{Attribute, Cell, CellAlignment, Color, Table, modifiers, presets};

use crate::{
    core::{
        period::Catalog,
        report::{ReportRow, TOTAL_LABEL},
    },
    quantity::cost::Cost,
};

fn new_table() -> Table {
    let mut table = Table::new();
    table
        .load_preset(presets::UTF8_FULL_CONDENSED)
        .apply_modifier(modifiers::UTF8_ROUND_CORNERS)
        .enforce_styling();
    table
}

fn numeric(value: impl ToString) -> Cell {
    Cell::new(value.to_string()).set_alignment(CellAlignment::Right)
}

pub fn build_report_table(rows: &[ReportRow]) -> Table {
    let mut table = new_table();
    table.set_header(vec![
        "Bucket", "Consumed", "Produced", "Net", "Cost", "Profit", "Net cost", "In", "Out",
    ]);
    for row in rows {
        let mut label = Cell::new(&row.label);
        if row.label == TOTAL_LABEL {
            label = label.add_attribute(Attribute::Bold);
        }
        table.add_row(vec![
            label,
            numeric(row.consumed),
            numeric(row.produced).add_attribute(Attribute::Dim),
            numeric(row.net_consumed),
            numeric(row.cost),
            numeric(row.profit).add_attribute(Attribute::Dim),
            numeric(row.net_cost).fg(if row.net_cost >= Cost::ZERO {
                Color::Red
            } else {
                Color::Green
            }),
            numeric(row.consumption_rate).add_attribute(Attribute::Dim),
            numeric(row.production_rate).add_attribute(Attribute::Dim),
        ]);
    }
    table
}

pub fn build_periods_table(catalog: &Catalog) -> Table {
    let mut table = new_table();
    table.set_header(vec!["Period", "From", "To", "Resolution"]);
    for period in catalog.iter() {
        table.add_row(vec![
            Cell::new(period.name),
            Cell::new(period.interval.start.format("%Y-%m-%d %H:%M")),
            Cell::new(period.interval.end.format("%Y-%m-%d %H:%M")).add_attribute(Attribute::Dim),
            Cell::new(period.resolution),
        ]);
    }
    table
}

pub fn build_freshness_table(rows: &[(String, Option<NaiveDateTime>)]) -> Table {
    let mut table = new_table();
    table.set_header(vec!["Series", "Latest reading"]);
    for (series, timestamp) in rows {
        table.add_row(vec![
            Cell::new(series),
            match timestamp {
                Some(timestamp) => Cell::new(timestamp.format("%Y-%m-%d %H:%M")),
                None => Cell::new("never").fg(Color::Red),
            },
        ]);
    }
    table
}
