use crate::App;
use anyhow::{Result, anyhow};
use clap::Args;
use regex::Regex;
use serde_json::{Map, Value};
use std::sync::LazyLock;

static VARIABLE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(.+)=(.*)$").expect("variable regex should compile"));

#[derive(Args, Debug)]
pub struct GraphQLArgs {
    /// GraphQL query
    #[arg(short, long)]
    query: String,

    /// Variable, as name=value
    #[arg(short = 'v', long = "var")]
    vars: Vec<String>,
}

pub fn run(app: &App, args: GraphQLArgs) -> Result<()> {
    let variables = parse_variables(&args.vars)?;
    let client = app.client()?;
    let data: Value = client.call(&args.query, Value::Object(variables))?;
    println!("{}", serde_json::to_string_pretty(&data)?);
    Ok(())
}

/// Variables are passed as strings. The name extends up to the last `=`.
fn parse_variables(vars: &[String]) -> Result<Map<String, Value>> {
    let mut variables = Map::new();
    for var in vars {
        let captures = VARIABLE
            .captures(var)
            .ok_or_else(|| anyhow!("Variable {var} must match name=value"))?;
        variables.insert(
            captures[1].to_string(),
            Value::String(captures[2].to_string()),
        );
    }
    Ok(variables)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vars(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_parse_variables() {
        let parsed = parse_variables(&vars(&["project=ontrack", "empty=", "expr=a=b"])).unwrap();
        assert_eq!(parsed["project"], "ontrack");
        assert_eq!(parsed["empty"], "");
        assert_eq!(parsed["expr=a"], "b");
    }

    #[test]
    fn test_invalid_variable() {
        let err = parse_variables(&vars(&["=value"])).unwrap_err();
        assert_eq!(err.to_string(), "Variable =value must match name=value");
        assert!(parse_variables(&vars(&["novalue"])).is_err());
    }
}
