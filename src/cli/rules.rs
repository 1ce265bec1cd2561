use anyhow::Result;
use bylines_core::ingest::RuleTableNormalizer;

pub fn run() -> Result<()> {
    let normalizer = RuleTableNormalizer::nyt();

    for (i, rule) in normalizer.rules().iter().enumerate() {
        println!("{:>2}  {:?} -> {:?}", i + 1, rule.pattern(), rule.replacement());
    }

    Ok(())
}
