//! Account snapshot, open positions and active orders.

#[derive(Debug, Clone, PartialEq)]
pub struct AccountSnapshot {
    pub id: String,
    pub status: String,
    pub cash: f64,
    pub portfolio_value: f64,
    pub buying_power: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Position {
    pub symbol: String,
    pub qty: f64,
    pub market_value: f64,
    pub unrealized_pl: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Order {
    pub symbol: String,
    pub side: String,
    pub qty: f64,
    pub order_type: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AccountSummary {
    pub account: AccountSnapshot,
    pub positions: Vec<Position>,
    pub orders: Vec<Order>,
}

impl AccountSummary {
    pub fn render(&self) -> String {
        let mut out = String::new();
        out.push_str("=== Account Summary ===\n");
        out.push_str(&format!(
            "Cash Balance: {}\n",
            format_money(self.account.cash)
        ));
        out.push_str(&format!(
            "Portfolio Value: {}\n",
            format_money(self.account.portfolio_value)
        ));
        out.push_str(&format!(
            "Buying Power: {}\n",
            format_money(self.account.buying_power)
        ));

        if self.positions.is_empty() {
            out.push_str("\nNo open positions\n");
        } else {
            out.push_str("\n=== Current Positions ===\n");
            for p in &self.positions {
                out.push_str(&format!("\n{}:\n", p.symbol));
                out.push_str(&format!("  Quantity: {}\n", p.qty));
                out.push_str(&format!(
                    "  Current Value: {}\n",
                    format_money(p.market_value)
                ));
                out.push_str(&format!(
                    "  Profit/Loss: {}\n",
                    format_money(p.unrealized_pl)
                ));
            }
        }

        if self.orders.is_empty() {
            out.push_str("\nNo active orders\n");
        } else {
            out.push_str("\n=== Active Orders ===\n");
            for o in &self.orders {
                out.push_str(&format!(
                    "\n{}: {} {} @ {}\n",
                    o.symbol,
                    title_case(&o.side),
                    o.qty,
                    o.order_type
                ));
            }
        }

        out
    }
}

/// `$1,234.56`, with a leading `-` for negative amounts.
pub fn format_money(value: f64) -> String {
    let sign = if value < 0.0 { "-" } else { "" };
    let cents = format!("{:.2}", value.abs());
    let (whole, frac) = cents.split_once('.').unwrap_or((&cents, "00"));

    let mut grouped = String::with_capacity(whole.len() + whole.len() / 3);
    for (i, ch) in whole.chars().enumerate() {
        if i > 0 && (whole.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    format!("{sign}${grouped}.{frac}")
}

fn title_case(s: &str) -> String {
    let lower = s.to_lowercase();
    let mut chars = lower.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
