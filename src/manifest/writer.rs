use super::model::{DependencySpec, OptionValue};

/// Renders one entry as a `gom` line, options sorted by key.
pub fn render_entry(dep: &DependencySpec) -> String {
    let mut line = format!("gom {}", quote(&dep.name));
    for (key, value) in dep.options.iter() {
        line.push_str(&format!(", :{} => {}", key, render_value(value)));
    }
    line
}

/// Renders a whole manifest, one entry per line.
pub fn render(deps: &[DependencySpec]) -> String {
    let mut out = String::new();
    for dep in deps {
        out.push_str(&render_entry(dep));
        out.push('\n');
    }
    out
}

fn render_value(value: &OptionValue) -> String {
    match value {
        OptionValue::Str(s) => quote(s),
        OptionValue::Symbol(s) => format!(":{}", s),
        OptionValue::List(items) => {
            let items: Vec<String> = items.iter().map(render_value).collect();
            format!("[{}]", items.join(", "))
        }
    }
}

// Single quotes unless the text itself contains one.
fn quote(s: &str) -> String {
    if s.contains('\'') {
        format!("\"{}\"", s)
    } else {
        format!("'{}'", s)
    }
}
