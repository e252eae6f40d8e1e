use dp_aligner::{Aligner, AlignmentMode, ScoringScheme, Sequence};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    let seq1 = Sequence::new(b"GATTACA");
    let seq2 = Sequence::new(b"GCATGCU");

    for mode in [AlignmentMode::Global, AlignmentMode::Local] {
        let aligner = Aligner::new(ScoringScheme::new(2, -1, -2)).with_alignment_mode(mode);
        let outcome = aligner.align(&seq1, &seq2)?;
        let (line1, line2) = outcome.alignment.aligned_strings();

        println!("{mode} alignment");
        println!("Score: {}", outcome.score());
        println!("Aligned sequence 1: {line1}");
        println!("                    {}", outcome.alignment.markup());
        println!("Aligned sequence 2: {line2}");
        println!("Operations: {:?}", outcome.alignment.operations);
        println!("Identity: {:.1}%", outcome.stats.identity);
        println!();
    }

    Ok(())
}
