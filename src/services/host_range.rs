use crate::models::{ExchangeResult, KeyExchangeError};

/// Marker replaced by each number of the range
pub const PLACEHOLDER: char = 'X';

/// Most numbers a single `start-end` span may produce
pub const MAX_SPAN_LEN: u32 = 65_536;

/// Expand a host template such as `10.20.0.X` into concrete addresses.
///
/// Templates without the placeholder are returned as-is. Otherwise every
/// number of `range` minus every number of `exclude` is substituted into the
/// first placeholder, in ascending numeric order. Duplicate numbers in
/// `range` yield duplicate hosts.
pub fn expand(
    template: &str,
    range: Option<&str>,
    exclude: Option<&str>,
) -> ExchangeResult<Vec<String>> {
    if !template.contains(PLACEHOLDER) {
        return Ok(vec![template.to_string()]);
    }

    let mut numbers = match range {
        Some(expr) => parse_range(expr)?,
        None => Vec::new(),
    };

    if let Some(expr) = exclude {
        if !numbers.is_empty() {
            let excluded = parse_list(expr)?;
            numbers.retain(|n| !excluded.contains(n));
        }
    }

    numbers.sort_unstable();

    let hosts: Vec<String> = numbers
        .iter()
        .map(|n| template.replacen(PLACEHOLDER, &n.to_string(), 1))
        .collect();

    log::info!("[host_range] remote hosts: {:?}", hosts);
    Ok(hosts)
}

/// `1-6,8,13-233` → every number, in input order, duplicates included
pub fn parse_range(expr: &str) -> ExchangeResult<Vec<u32>> {
    let mut numbers = Vec::new();

    for token in expr.split(',').map(str::trim).filter(|t| !t.is_empty()) {
        match token.split_once('-') {
            Some((start, end)) => {
                let start = parse_number(start)?;
                let end = parse_number(end)?;
                if end >= start && end - start >= MAX_SPAN_LEN {
                    return Err(KeyExchangeError::RangeParse {
                        token: token.to_string(),
                    });
                }
                // Reversed spans are empty
                numbers.extend(start..=end);
            }
            None => numbers.push(parse_number(token)?),
        }
    }

    Ok(numbers)
}

/// `2,4,9` → the listed numbers
pub fn parse_list(expr: &str) -> ExchangeResult<Vec<u32>> {
    expr.split(',')
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(parse_number)
        .collect()
}

fn parse_number(token: &str) -> ExchangeResult<u32> {
    let token = token.trim();
    token.parse::<u32>().map_err(|_| KeyExchangeError::RangeParse {
        token: token.to_string(),
    })
}
