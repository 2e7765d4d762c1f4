// Parser for filter selection expressions such as `sex=female,male`

use anyhow::{anyhow, Result};
use nom::{
    branch::alt,
    bytes::complete::{take_while, take_while1},
    character::complete::{char, multispace0},
    combinator::all_consuming,
    multi::separated_list0,
    sequence::delimited,
    IResult,
};

/// A filter id and the option ids selected for it. An empty list selects nothing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectionExpr {
    pub filter_id: String,
    pub option_ids: Vec<String>,
}

fn identifier(input: &str) -> IResult<&str, &str> {
    take_while1(|c: char| c.is_alphanumeric() || matches!(c, '_' | '-' | '.'))(input)
}

/// `"..."`, for ids containing commas or spaces
fn quoted(input: &str) -> IResult<&str, &str> {
    delimited(char('"'), take_while(|c: char| c != '"'), char('"'))(input)
}

fn bare(input: &str) -> IResult<&str, &str> {
    take_while1(|c: char| c != ',' && c != '"' && !c.is_whitespace())(input)
}

fn option_id(input: &str) -> IResult<&str, &str> {
    delimited(multispace0, alt((quoted, bare)), multispace0)(input)
}

fn selection(input: &str) -> IResult<&str, SelectionExpr> {
    let (input, filter_id) = delimited(multispace0, identifier, multispace0)(input)?;
    let (input, _) = char('=')(input)?;
    let (input, ids) = separated_list0(char(','), option_id)(input)?;
    let (input, _) = multispace0(input)?;

    Ok((
        input,
        SelectionExpr {
            filter_id: filter_id.to_string(),
            option_ids: ids.into_iter().map(str::to_string).collect(),
        },
    ))
}

/// Parse `filter=id1,id2`. The whole input must be consumed.
pub fn parse_selection(input: &str) -> Result<SelectionExpr> {
    all_consuming(selection)(input)
        .map(|(_, expr)| expr)
        .map_err(|e| anyhow!("Invalid selection '{}': {:?}", input, e))
}
