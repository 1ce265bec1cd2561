use anyhow::Result;
use bylines_core::ingest::{Normalizer, RuleTableNormalizer};
use bylines_core::AuthorToken;

pub fn run(bylines: &[String]) -> Result<()> {
    let normalizer = RuleTableNormalizer::nyt();

    for byline in bylines {
        let names: Vec<String> = normalizer
            .tokens(byline)
            .into_iter()
            .map(AuthorToken::into_string)
            .collect();
        println!("{}", names.join(" | "));
    }

    Ok(())
}
