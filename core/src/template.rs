//! Parameter mapping, printf-style template formatting, and shell-style word splitting: the pure
//! logic behind a general block's argv assembly. Kept free of I/O and the evaluator's recursion
//! so it can be unit tested directly.

use crate::error::EvaluatorError;
use serde_json::Value;

/// Render a settings value the way a GUI field is expected to show up in an argv token: strings
/// pass through verbatim, everything else is rendered via its JSON text form (numbers without
/// quotes, booleans as `true`/`false`).
fn value_to_token(value: &Value) -> String {
	match value {
		Value::String(s) => s.clone(),
		Value::Null => String::new(),
		other => other.to_string(),
	}
}

/// Apply `parameter_mappings`: for each GUI field, in declared order, substitute the
/// mapped string if `parameter_mappings[field][raw_value]` exists, otherwise pass the raw value
/// through.
pub fn apply_parameter_mappings(
	settings: &serde_json::Map<String, Value>,
	gui_fields: &[String],
	parameter_mappings: &Value,
) -> Vec<String> {
	gui_fields
		.iter()
		.map(|field| {
			let raw = settings.get(field).cloned().unwrap_or(Value::Null);
			let raw_token = value_to_token(&raw);

			let mapped = parameter_mappings
				.get(field)
				.and_then(|field_map| field_map.get(&raw_token))
				.map(value_to_token);

			mapped.unwrap_or(raw_token)
		})
		.collect()
}

/// Count the `%s`/`%d` conversion specifiers in a printf-style template, treating `%%` as a
/// literal percent rather than a conversion.
pub fn count_placeholders(template: &str) -> usize {
	let mut count = 0;
	let mut chars = template.chars().peekable();
	while let Some(c) = chars.next() {
		if c != '%' {
			continue;
		}
		match chars.peek() {
			Some('%') => {
				chars.next();
			}
			Some('s') | Some('d') => {
				chars.next();
				count += 1;
			}
			_ => {}
		}
	}
	count
}

/// Substitute each `%s`/`%d` conversion in `template`, in order, left to right, with the
/// corresponding already-mapped value. `%d` reformats the value through
/// an integer parse when possible and otherwise falls back to the raw text (deliberately
/// permissive: the evaluator's job is argv-safety, not strict printf validation).
pub fn format_template(template: &str, values: &[String]) -> String {
	let mut out = String::with_capacity(template.len());
	let mut chars = template.chars().peekable();
	let mut values = values.iter();
	while let Some(c) = chars.next() {
		if c != '%' {
			out.push(c);
			continue;
		}
		match chars.peek() {
			Some('%') => {
				chars.next();
				out.push('%');
			}
			Some('s') => {
				chars.next();
				if let Some(v) = values.next() {
					out.push_str(v);
				}
			}
			Some('d') => {
				chars.next();
				if let Some(v) = values.next() {
					match v.trim().parse::<i64>() {
						Ok(n) => out.push_str(&n.to_string()),
						Err(_) => out.push_str(v),
					}
				}
			}
			_ => out.push('%'),
		}
	}
	out
}

/// Shell-style word splitting: whitespace separates tokens, matched single or double quotes
/// preserve whitespace inside a token, and a backslash escapes the following character. This is
/// the tokenizer applied to the formatted template string before its tokens are appended
/// directly to argv — never through an actual shell.
pub fn shell_split(input: &str) -> Vec<String> {
	let mut tokens = Vec::new();
	let mut current = String::new();
	let mut in_token = false;
	let mut quote: Option<char> = None;
	let mut chars = input.chars().peekable();

	while let Some(c) = chars.next() {
		match quote {
			Some(q) => {
				if c == q {
					quote = None;
				} else if c == '\\' && q == '"' {
					if let Some(&next) = chars.peek() {
						if next == '"' || next == '\\' {
							current.push(chars.next().unwrap());
							continue;
						}
					}
					current.push(c);
				} else {
					current.push(c);
				}
			}
			None => match c {
				'"' | '\'' => {
					quote = Some(c);
					in_token = true;
				}
				'\\' => {
					if let Some(next) = chars.next() {
						current.push(next);
						in_token = true;
					}
				}
				c if c.is_whitespace() => {
					if in_token {
						tokens.push(std::mem::take(&mut current));
						in_token = false;
					}
				}
				c => {
					current.push(c);
					in_token = true;
				}
			},
		}
	}
	if in_token || quote.is_some() {
		tokens.push(current);
	}
	tokens
}

/// Split `mapped` GUI values into the positional prefix and the templated suffix, returning the
/// final argv fragment `[positional…, templated_tokens…]`.
pub fn build_parameter_argv(
	idblock: i32,
	parameter_template: &str,
	gui_fields: &[String],
	mapped: &[String],
) -> Result<Vec<String>, EvaluatorError> {
	let placeholders = count_placeholders(parameter_template);
	let fields = gui_fields.len();
	if fields < placeholders {
		return Err(EvaluatorError::TemplateOverflow {
			idblock,
			placeholders,
			fields,
		});
	}

	let positional_count = fields - placeholders;
	let (positional, templated_values) = mapped.split_at(positional_count.min(mapped.len()));

	let mut argv: Vec<String> = positional
		.iter()
		.filter(|s| !s.is_empty())
		.cloned()
		.collect();

	if placeholders > 0 {
		let formatted = format_template(parameter_template, templated_values);
		argv.extend(shell_split(&formatted).into_iter().filter(|s| !s.is_empty()));
	} else if !parameter_template.is_empty() {
		argv.extend(shell_split(parameter_template).into_iter().filter(|s| !s.is_empty()));
	}

	Ok(argv)
}
