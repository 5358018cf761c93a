pub fn render_schema() -> String {
	expand_includes(include_str!("../../../sql/init.sql"))
}

/// Inlines `\ir` directives so the schema can be applied without psql.
fn expand_includes(sql: &str) -> String {
	let mut out = String::new();

	for line in sql.lines() {
		let include = line.trim().strip_prefix("\\ir ").map(str::trim);

		match include {
			Some("tables/001_disaster_records.sql") =>
				out.push_str(include_str!("../../../sql/tables/001_disaster_records.sql")),
			_ => out.push_str(line),
		}

		out.push('\n');
	}

	out
}
