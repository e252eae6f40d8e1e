use dp_aligner::{
    Aligner, AlignmentMode, BatchAligner, FillStrategy, OptimizationConfig, ScoringScheme, Sequence,
};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    let sequences = vec![
        (Sequence::new(b"ACGTACGT"), Sequence::new(b"ACGTAGCT")),
        (Sequence::new(b"GGTTAACC"), Sequence::new(b"GGTTAACT")),
        (Sequence::new(b"TTACGTT"), Sequence::new(b"ACG")),
    ];

    let config = OptimizationConfig {
        fill_strategy: FillStrategy::Wavefront,
        parallel_threshold: 64,
    };
    let aligner = Aligner::new(ScoringScheme::default())
        .with_alignment_mode(AlignmentMode::Global)
        .with_optimizations(config);

    let mut batch = BatchAligner::new(aligner, 2)?;
    let results = batch.align_all(sequences)?;

    for (i, outcome) in results.iter().enumerate() {
        let (line1, line2) = outcome.alignment.aligned_strings();
        println!("Alignment {}: Score = {}", i, outcome.score());
        println!("Sequence 1: {line1}");
        println!("Sequence 2: {line2}");
        println!();
    }

    Ok(())
}
