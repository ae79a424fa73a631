use traitdyn_sim::simulation::{MatrixConfig, ModelConfig, RunConfig};

fn format_rows(rows: &[Vec<f64>]) -> String {
    let inner: Vec<String> = rows
        .iter()
        .map(|r| {
            let cells: Vec<String> = r.iter().map(|x| format!("{x}")).collect();
            format!("[{}]", cells.join(", "))
        })
        .collect();
    format!("[{}]", inner.join(", "))
}

pub fn print_run_parameters(config: &RunConfig) {
    println!("📋 Run Configuration");
    println!("  • Regime: {}", config.model.regime());
    println!("  • Replicates: {} [-n, --reps]", config.n_reps);
    println!("  • Threads: {} [-t, --threads]", config.threads);
    match config.seed {
        Some(seed) => println!("  • Random Seed: {seed} [--seed]"),
        None => println!("  • Random Seed: Random [--seed]"),
    }

    let q = config.initial.traits.first().map_or(0, Vec::len);
    println!("\n🌱 Initial Community");
    println!("  • Populations: {}", config.initial.abundances.len());
    println!("  • Traits per population: {q}");

    let eco = &config.ecology;
    println!("\n🌍 Ecology");
    println!("  • f (trait cost): {}", eco.f);
    println!("  • a0 (competition): {}", eco.a0);
    println!("  • r0 (intrinsic growth): {}", eco.r0);
    match &eco.c {
        Some(rows) => println!("  • C: {}", format_rows(rows)),
        None => println!("  • C: unit diagonal, off-diagonal eta = {}", eco.eta),
    }
    match &eco.d {
        MatrixConfig::Scalar(d) => println!("  • D: {d} × I"),
        MatrixConfig::Rows(rows) => println!("  • D: {}", format_rows(rows)),
    }

    match &config.model {
        ModelConfig::AdaptiveDynamics(m) => {
            println!("\n⚡ Adaptive Dynamics");
            println!("  • Steps: {} (snapshot every {})", m.max_t, m.save_every);
            println!(
                "  • Mutation: prob {:.2e}, sd {}, split {}",
                m.mut_prob, m.mut_sd, m.mut_split
            );
            println!("  • Max clones: {}", m.max_clones);
            println!("  • Extinction threshold: {:.2e}", m.min_n);
            if m.sigma_n > 0.0 || m.sigma_v0 > 0.0 {
                println!("  • Noise: sigma_N {}, sigma_V0 {}", m.sigma_n, m.sigma_v0);
            }
            if m.keep_pos {
                println!("  • Traits kept non-negative");
            }
        }
        ModelConfig::QuantitativeGenetics(m) => {
            println!("\n⚡ Quantitative Genetics");
            println!(
                "  • Steps: {} settling + {} recorded (snapshot every {})",
                m.start_t, m.max_t, m.save_every
            );
            println!("  • Perturbation sd after settling: {}", m.mut_sd);
            println!("  • Extinction threshold: {:.2e}", m.min_n);
            if m.sigma_n > 0.0 || m.sigma_v0 > 0.0 || !m.sigma_v.is_empty() {
                println!(
                    "  • Noise: sigma_N {}, sigma_V0 {}, sigma_V {:?}",
                    m.sigma_n, m.sigma_v0, m.sigma_v
                );
            }
            if m.keep_pos {
                println!("  • Traits kept non-negative");
            }
        }
    }
    println!();
}
