//! Column definitions of the order table: how each column sorts and how its
//! cells are presented.

use std::{cmp::Ordering, fmt, str::FromStr};

use chrono::TimeZone;
use icu_collator::{Collator, CollatorOptions};
use icu_locid::locale;
use rust_decimal::{Decimal, RoundingStrategy};
use shared::domain::PurchaseOrderLine;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SortColumn {
    Id,
    VendorName,
    OrderDate,
    ModelNumber,
    UnitPrice,
    Quantity,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnKind {
    Numeric,
    Text,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColumnDef {
    pub column: SortColumn,
    pub key: &'static str,
    pub title: &'static str,
    pub kind: ColumnKind,
}

/// Table columns in display order.
pub const COLUMNS: [ColumnDef; 6] = [
    ColumnDef {
        column: SortColumn::Id,
        key: "id",
        title: "ID",
        kind: ColumnKind::Numeric,
    },
    ColumnDef {
        column: SortColumn::VendorName,
        key: "vendor_name",
        title: "Vendor Name",
        kind: ColumnKind::Text,
    },
    ColumnDef {
        column: SortColumn::OrderDate,
        key: "order_date",
        title: "Order Date",
        kind: ColumnKind::Numeric,
    },
    ColumnDef {
        column: SortColumn::ModelNumber,
        key: "model_number",
        title: "Model Number",
        kind: ColumnKind::Text,
    },
    ColumnDef {
        column: SortColumn::UnitPrice,
        key: "unit_price",
        title: "Unit Price",
        kind: ColumnKind::Numeric,
    },
    ColumnDef {
        column: SortColumn::Quantity,
        key: "quantity",
        title: "Quantity",
        kind: ColumnKind::Numeric,
    },
];

impl SortColumn {
    pub fn def(self) -> &'static ColumnDef {
        let index = match self {
            SortColumn::Id => 0,
            SortColumn::VendorName => 1,
            SortColumn::OrderDate => 2,
            SortColumn::ModelNumber => 3,
            SortColumn::UnitPrice => 4,
            SortColumn::Quantity => 5,
        };
        &COLUMNS[index]
    }

    pub fn key(self) -> &'static str {
        self.def().key
    }

    pub fn kind(self) -> ColumnKind {
        self.def().kind
    }
}

impl fmt::Display for SortColumn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown column '{0}'; expected one of id, vendor_name, order_date, model_number, unit_price, quantity")]
pub struct UnknownColumn(pub String);

impl FromStr for SortColumn {
    type Err = UnknownColumn;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let wanted = raw.trim();
        COLUMNS
            .iter()
            .find(|def| def.key.eq_ignore_ascii_case(wanted))
            .map(|def| def.column)
            .ok_or_else(|| UnknownColumn(raw.to_string()))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    Ascending,
    Descending,
}

/// The single active sort criterion of the table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SortOrder {
    pub column: SortColumn,
    pub direction: SortDirection,
}

impl SortOrder {
    pub fn ascending(column: SortColumn) -> Self {
        Self {
            column,
            direction: SortDirection::Ascending,
        }
    }

    pub fn descending(column: SortColumn) -> Self {
        Self {
            column,
            direction: SortDirection::Descending,
        }
    }

    /// Next criterion after clicking `column`'s header: ascending, then
    /// descending, then unsorted. Another column always restarts at ascending.
    pub fn toggle(current: Option<SortOrder>, column: SortColumn) -> Option<SortOrder> {
        match current {
            Some(order) if order.column == column => match order.direction {
                SortDirection::Ascending => Some(SortOrder::descending(column)),
                SortDirection::Descending => None,
            },
            _ => Some(SortOrder::ascending(column)),
        }
    }

    pub fn compare(self, a: &PurchaseOrderLine, b: &PurchaseOrderLine) -> Ordering {
        let ordering = compare_by_column(a, b, self.column);
        match self.direction {
            SortDirection::Ascending => ordering,
            SortDirection::Descending => ordering.reverse(),
        }
    }
}

pub fn compare_by_column(
    a: &PurchaseOrderLine,
    b: &PurchaseOrderLine,
    column: SortColumn,
) -> Ordering {
    match column {
        SortColumn::Id => a.id.cmp(&b.id),
        SortColumn::VendorName => locale_compare(&a.vendor_name, &b.vendor_name),
        SortColumn::OrderDate => a.order_date.cmp(&b.order_date),
        SortColumn::ModelNumber => locale_compare(&a.model_number, &b.model_number),
        SortColumn::UnitPrice => a.unit_price.total_cmp(&b.unit_price),
        SortColumn::Quantity => a.quantity.cmp(&b.quantity),
    }
}

thread_local! {
    static COLLATOR: Option<Collator> =
        Collator::try_new(&locale!("en").into(), CollatorOptions::new()).ok();
}

/// Collation order of the `en` locale: accents and case only break ties
/// between otherwise equal strings, lowercase first.
pub fn locale_compare(a: &str, b: &str) -> Ordering {
    COLLATOR.with(|collator| match collator {
        Some(collator) => collator.compare(a, b),
        None => folded_compare(a, b),
    })
}

fn folded_compare(a: &str, b: &str) -> Ordering {
    a.chars()
        .flat_map(char::to_lowercase)
        .cmp(b.chars().flat_map(char::to_lowercase))
        .then_with(|| b.cmp(a))
}

/// Stable display ordering; `None` keeps the server order.
pub fn sorted_lines(lines: &[PurchaseOrderLine], sort: Option<SortOrder>) -> Vec<PurchaseOrderLine> {
    let mut ordered = lines.to_vec();
    if let Some(order) = sort {
        ordered.sort_by(|a, b| order.compare(a, b));
    }
    ordered
}

pub fn format_order_date<Tz>(millis: i64, tz: &Tz) -> String
where
    Tz: TimeZone,
    Tz::Offset: fmt::Display,
{
    match tz.timestamp_millis_opt(millis).single() {
        Some(at) => at.format("%-m/%-d/%Y").to_string(),
        None => "Invalid Date".to_string(),
    }
}

/// Two fractional digits, exact midpoints rounded away from zero.
pub fn format_unit_price(unit_price: f64) -> String {
    match Decimal::from_f64_retain(unit_price) {
        Some(price) => {
            let rounded = price.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
            format!("${rounded:.2}")
        }
        None => format!("${unit_price:.2}"),
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DisplayRow {
    pub id: String,
    pub vendor_name: String,
    pub order_date: String,
    pub model_number: String,
    pub unit_price: String,
    pub quantity: String,
}

impl DisplayRow {
    pub fn from_line<Tz>(line: &PurchaseOrderLine, tz: &Tz) -> Self
    where
        Tz: TimeZone,
        Tz::Offset: fmt::Display,
    {
        Self {
            id: line.id.to_string(),
            vendor_name: line.vendor_name.clone(),
            order_date: format_order_date(line.order_date, tz),
            model_number: line.model_number.clone(),
            unit_price: format_unit_price(line.unit_price),
            quantity: line.quantity.to_string(),
        }
    }

    pub fn cell(&self, column: SortColumn) -> &str {
        match column {
            SortColumn::Id => &self.id,
            SortColumn::VendorName => &self.vendor_name,
            SortColumn::OrderDate => &self.order_date,
            SortColumn::ModelNumber => &self.model_number,
            SortColumn::UnitPrice => &self.unit_price,
            SortColumn::Quantity => &self.quantity,
        }
    }
}

fn header_title(def: &ColumnDef, sort: Option<SortOrder>) -> String {
    match sort {
        Some(order) if order.column == def.column => {
            let marker = match order.direction {
                SortDirection::Ascending => '▲',
                SortDirection::Descending => '▼',
            };
            format!("{} {marker}", def.title)
        }
        _ => def.title.to_string(),
    }
}

fn pad(text: &str, width: usize, kind: ColumnKind) -> String {
    let fill = " ".repeat(width.saturating_sub(text.chars().count()));
    match kind {
        ColumnKind::Numeric => format!("{fill}{text}"),
        ColumnKind::Text => format!("{text}{fill}"),
    }
}

/// Bordered plain-text table of `rows`, with a marker on the sorted column.
pub fn render_table(rows: &[DisplayRow], sort: Option<SortOrder>) -> String {
    let titles: Vec<String> = COLUMNS.iter().map(|def| header_title(def, sort)).collect();
    let widths: Vec<usize> = COLUMNS
        .iter()
        .zip(&titles)
        .map(|(def, title)| {
            rows.iter()
                .map(|row| row.cell(def.column).chars().count())
                .chain(std::iter::once(title.chars().count()))
                .max()
                .unwrap_or_default()
        })
        .collect();

    let border = {
        let mut line = String::from("+");
        for width in &widths {
            line.push_str(&"-".repeat(width + 2));
            line.push('+');
        }
        line
    };

    let mut out = String::new();
    out.push_str(&border);
    out.push('\n');
    for (title, width) in titles.iter().zip(&widths) {
        out.push_str("| ");
        out.push_str(&pad(title, *width, ColumnKind::Text));
        out.push(' ');
    }
    out.push_str("|\n");
    out.push_str(&border);
    out.push('\n');

    if rows.is_empty() {
        let inner = widths.iter().map(|w| w + 3).sum::<usize>() - 3;
        out.push_str("| ");
        out.push_str(&pad("No data", inner, ColumnKind::Text));
        out.push_str(" |\n");
    }
    for row in rows {
        for (def, width) in COLUMNS.iter().zip(&widths) {
            out.push_str("| ");
            out.push_str(&pad(row.cell(def.column), *width, def.kind));
            out.push(' ');
        }
        out.push_str("|\n");
    }
    out.push_str(&border);
    out
}
