use centra::{assign_batch, persist, summarize, Kmeans};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Minimal end-to-end: vectors -> model -> artifact -> assignments -> report.
    //
    // It intentionally stays small: it exists primarily to validate that the
    // whole train/persist/assign/report path builds and runs.

    // Two obvious clusters in 2D.
    let vectors: Vec<Vec<f64>> = vec![
        // Cluster A (near (0,0))
        vec![0.0, 0.0],
        vec![0.1, 0.0],
        vec![0.0, 0.1],
        vec![0.1, 0.1],
        // Cluster B (near (10,10))
        vec![10.0, 10.0],
        vec![10.1, 10.0],
        vec![10.0, 10.1],
        vec![10.1, 10.1],
    ];

    let model = Kmeans::new(2).with_seed(7).train(&vectors)?;
    if let Some(diag) = model.diagnostics() {
        println!(
            "trained in {} iterations, inertia {:.4}",
            diag.iterations, diag.inertia
        );
    }

    // Round-trip through the binary artifact to show the persisted form is
    // all an assigner needs.
    let bytes = persist::to_bytes(&model);
    let reloaded = persist::from_bytes(&bytes)?;

    let assignments = assign_batch(&reloaded, &vectors)?;
    let report = summarize(&assignments, &vectors, &[0, 1])?;
    println!("{report}");

    Ok(())
}
