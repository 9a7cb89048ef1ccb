use anyhow::{Context, Result};

use data_sweeper::data::export::export;
use data_sweeper::data::{build_column, CellValue, ColumnType, FileFormat, Table};

/// Minimal deterministic PRNG (xoshiro256**)
struct SimpleRng {
    state: [u64; 4],
}

impl SimpleRng {
    fn new(seed: u64) -> Self {
        let mut s = [0u64; 4];
        let mut x = seed;
        for slot in &mut s {
            x = x.wrapping_mul(6364136223846793005).wrapping_add(1);
            *slot = x;
        }
        SimpleRng { state: s }
    }

    fn next_u64(&mut self) -> u64 {
        let result = (self.state[1].wrapping_mul(5))
            .rotate_left(7)
            .wrapping_mul(9);
        let t = self.state[1] << 17;
        self.state[2] ^= self.state[0];
        self.state[3] ^= self.state[1];
        self.state[1] ^= self.state[2];
        self.state[0] ^= self.state[3];
        self.state[2] ^= t;
        self.state[3] = self.state[3].rotate_left(45);
        result
    }

    fn next_f64(&mut self) -> f64 {
        (self.next_u64() >> 11) as f64 / (1u64 << 53) as f64
    }

    fn pick<'a>(&mut self, items: &[&'a str]) -> &'a str {
        items[(self.next_u64() % items.len() as u64) as usize]
    }

    fn chance(&mut self, p: f64) -> bool {
        self.next_f64() < p
    }
}

type Row = (i64, &'static str, &'static str, Option<f64>, Option<f64>, bool);

fn main() -> Result<()> {
    let mut rng = SimpleRng::new(42);

    let regions = ["North", "South", "East", "West"];
    let products = ["Widget", "Gadget", "Gizmo"];

    let mut rows: Vec<Row> = Vec::new();
    for order_id in 1..=40 {
        let units = (!rng.chance(0.15)).then(|| (1 + rng.next_u64() % 20) as f64);
        let price = (!rng.chance(0.1)).then(|| (rng.next_f64() * 50.0 * 100.0).round() / 100.0);
        let row = (
            order_id,
            rng.pick(&regions),
            rng.pick(&products),
            units,
            price,
            rng.chance(0.2),
        );
        rows.push(row);

        // Re-submitted orders: exact duplicates for the cleaner to find.
        if rng.chance(0.12) {
            rows.push(row);
        }
    }

    let table = Table::new(vec![
        build_column(
            "order_id",
            ColumnType::Integer,
            &rows.iter().map(|r| CellValue::Integer(r.0)).collect::<Vec<_>>(),
        ),
        build_column(
            "region",
            ColumnType::Text,
            &rows.iter().map(|r| CellValue::Text(r.1.to_string())).collect::<Vec<_>>(),
        ),
        build_column(
            "product",
            ColumnType::Text,
            &rows.iter().map(|r| CellValue::Text(r.2.to_string())).collect::<Vec<_>>(),
        ),
        build_column(
            "units",
            ColumnType::Float,
            &rows.iter().map(|r| r.3.map_or(CellValue::Missing, CellValue::Float)).collect::<Vec<_>>(),
        ),
        build_column(
            "unit_price",
            ColumnType::Float,
            &rows.iter().map(|r| r.4.map_or(CellValue::Missing, CellValue::Float)).collect::<Vec<_>>(),
        ),
        build_column(
            "returned",
            ColumnType::Boolean,
            &rows.iter().map(|r| CellValue::Bool(r.5)).collect::<Vec<_>>(),
        ),
    ])?;

    for format in FileFormat::ALL {
        let buffer = export(&table, format, "sample_data")?;
        std::fs::write(&buffer.file_name, buffer.bytes())
            .with_context(|| format!("writing {}", buffer.file_name))?;
        println!(
            "Wrote {} rows ({} bytes) to {}",
            table.row_count(),
            buffer.len(),
            buffer.file_name
        );
    }

    Ok(())
}
