//! Argument vector construction
//!
//! A [`RunInvocation`] is the full argv handed to both the server and the
//! client: the fixed algorithm prefix, then `--<name> <value>` for every
//! swept parameter in declared order.

use std::fmt;

use serde::Serialize;

use super::table::ParameterRow;
use crate::common::{Error, Result};

/// Ordered argument vector shared by server and client
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct RunInvocation {
    args: Vec<String>,
}

impl RunInvocation {
    pub fn args(&self) -> &[String] {
        &self.args
    }
}

impl fmt::Display for RunInvocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, arg) in self.args.iter().enumerate() {
            if i > 0 {
                f.write_str(" ")?;
            }
            if arg.is_empty() || arg.contains(char::is_whitespace) {
                write!(f, "'{}'", arg)?;
            } else {
                f.write_str(arg)?;
            }
        }
        Ok(())
    }
}

/// Build the invocation for one row
///
/// Parameters are emitted in the order of `parameters`, never in column
/// order. A row without a value for any of them is rejected.
pub fn build_invocation(
    prefix: &[String],
    parameters: &[String],
    row: &ParameterRow,
) -> Result<RunInvocation> {
    let mut args = Vec::with_capacity(prefix.len() + 2 * parameters.len());
    args.extend(prefix.iter().cloned());

    for name in parameters {
        let value = row
            .get(name)
            .ok_or_else(|| Error::missing_field(row.number(), name))?;
        args.push(format!("--{}", name));
        args.push(value.to_string());
    }

    Ok(RunInvocation { args })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strings(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_prefix_then_parameters_in_declared_order() {
        let prefix = strings(&["-B", "128", "--perf"]);
        let parameters = strings(&["clientSetSize", "serverSetSize"]);
        let row = ParameterRow::from_pairs(1, [("serverSetSize", "200"), ("clientSetSize", "100")]);

        let invocation = build_invocation(&prefix, &parameters, &row).unwrap();
        assert_eq!(
            invocation.args(),
            &strings(&[
                "-B",
                "128",
                "--perf",
                "--clientSetSize",
                "100",
                "--serverSetSize",
                "200"
            ])[..]
        );
    }

    #[test]
    fn test_same_input_same_output() {
        let prefix = strings(&["--fhe"]);
        let parameters = strings(&["maxPP", "nSimpleHF", "eachCuckooTableSize"]);
        let row = ParameterRow::from_pairs(
            7,
            [("eachCuckooTableSize", "12"), ("maxPP", "10"), ("nSimpleHF", "3"), ("extra", "x")],
        );

        let first = build_invocation(&prefix, &parameters, &row).unwrap();
        for _ in 0..10 {
            assert_eq!(build_invocation(&prefix, &parameters, &row).unwrap(), first);
        }
        assert!(!first.args().contains(&"--extra".to_string()));
    }

    #[test]
    fn test_missing_parameter_is_rejected() {
        let parameters = strings(&["clientSetSize", "maxPP"]);
        let row = ParameterRow::from_pairs(4, [("clientSetSize", "100")]);

        match build_invocation(&[], &parameters, &row) {
            Err(Error::MissingField { row, name }) => {
                assert_eq!(row, 4);
                assert_eq!(name, "maxPP");
            }
            other => panic!("Expected MissingField, got {:?}", other),
        }
    }

    #[test]
    fn test_display_quotes_awkward_values() {
        let parameters = strings(&["curve", "port"]);
        let row = ParameterRow::from_pairs(1, [("curve", "P 256"), ("port", "")]);
        let invocation = build_invocation(&strings(&["--perf"]), &parameters, &row).unwrap();
        assert_eq!(invocation.to_string(), "--perf --curve 'P 256' --port ''");
    }

    #[test]
    fn test_serializes_as_plain_array() {
        let row = ParameterRow::from_pairs(1, [("maxPP", "10")]);
        let invocation =
            build_invocation(&strings(&["-B", "128"]), &strings(&["maxPP"]), &row).unwrap();
        assert_eq!(
            serde_json::to_string(&invocation).unwrap(),
            r#"["-B","128","--maxPP","10"]"#
        );
    }
}
