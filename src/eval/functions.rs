//! The closed function catalogue available to rate and guard expressions.
//! Nothing outside this list is callable; `compile()` rejects unknown names
//! before a simulation ever runs.

use rand::Rng;
use rand::RngCore;

pub const NAMES: &[&str] = &[
    "exp",
    "log",
    "sqrt",
    "sin",
    "cos",
    "pow",
    "min",
    "max",
    "abs",
    "floor",
    "ceil",
    "sigmoid",
    "michaelis_menten",
    "mass_action",
    "wiener",
];

pub fn is_known(name: &str) -> bool {
    NAMES.contains(&name)
}

/// Samples a standard-normal value via the Box–Muller transform, using
/// whatever RNG the caller's run is seeded with. A fresh sample is drawn on
/// every call; `wiener()` is a stateless perturbation, not an integrated
/// path (see the Open Question decision in the design ledger).
pub fn sample_standard_normal(rng: &mut dyn RngCore) -> f64 {
    let u1: f64 = rng.random_range(f64::EPSILON..1.0);
    let u2: f64 = rng.random_range(0.0..1.0);
    (-2.0 * u1.ln()).sqrt() * (std::f64::consts::TAU * u2).cos()
}

pub fn call(name: &str, args: &[f64], rng: &mut dyn RngCore) -> anyhow::Result<f64> {
    match name {
        "exp" => unary(name, args, f64::exp),
        "log" => unary(name, args, f64::ln),
        "sqrt" => unary(name, args, f64::sqrt),
        "sin" => unary(name, args, f64::sin),
        "cos" => unary(name, args, f64::cos),
        "abs" => unary(name, args, f64::abs),
        "floor" => unary(name, args, f64::floor),
        "ceil" => unary(name, args, f64::ceil),
        "pow" => binary(name, args, f64::powf),
        "min" => variadic(name, args, f64::INFINITY, f64::min),
        "max" => variadic(name, args, f64::NEG_INFINITY, f64::max),
        "sigmoid" => {
            let [x, center, steepness] = exact::<3>(name, args)?;
            Ok(1.0 / (1.0 + (-steepness * (x - center)).exp()))
        }
        "michaelis_menten" => {
            let [s, vmax, km] = exact::<3>(name, args)?;
            Ok(vmax * s / (km + s))
        }
        "mass_action" => {
            if args.len() < 2 {
                anyhow::bail!("mass_action requires a rate constant and at least one reactant");
            }
            let k = args[0];
            Ok(args[1..].iter().fold(k, |product, reactant| product * reactant))
        }
        "wiener" => {
            // time argument is accepted for grammar symmetry but the sample
            // does not depend on it: each call is an independent draw.
            exact::<1>(name, args)?;
            Ok(sample_standard_normal(rng))
        }
        other => anyhow::bail!("call to unknown function {:?}; this should have been rejected at compile time", other),
    }
}

fn unary(name: &str, args: &[f64], f: impl Fn(f64) -> f64) -> anyhow::Result<f64> {
    let [x] = exact::<1>(name, args)?;
    Ok(f(x))
}

fn binary(name: &str, args: &[f64], f: impl Fn(f64, f64) -> f64) -> anyhow::Result<f64> {
    let [x, y] = exact::<2>(name, args)?;
    Ok(f(x, y))
}

fn variadic(name: &str, args: &[f64], seed: f64, f: impl Fn(f64, f64) -> f64) -> anyhow::Result<f64> {
    if args.is_empty() {
        anyhow::bail!("{} requires at least one argument", name);
    }
    Ok(args.iter().fold(seed, |acc, &x| f(acc, x)))
}

fn exact<const N: usize>(name: &str, args: &[f64]) -> anyhow::Result<[f64; N]> {
    if args.len() != N {
        anyhow::bail!("{} expects {} argument(s), got {}", name, N, args.len());
    }
    let mut out = [0.0; N];
    out.copy_from_slice(args);
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::SmallRng;

    #[test]
    fn michaelis_menten_matches_formula() {
        let mut rng = SmallRng::seed_from_u64(0);
        let v = call("michaelis_menten", &[2.0, 10.0, 2.0], &mut rng).unwrap();
        assert!((v - 5.0).abs() < 1e-9);
    }

    #[test]
    fn mass_action_multiplies_reactants() {
        let mut rng = SmallRng::seed_from_u64(0);
        let v = call("mass_action", &[0.5, 2.0, 3.0], &mut rng).unwrap();
        assert!((v - 3.0).abs() < 1e-9);
    }

    #[test]
    fn wiener_is_deterministic_given_seed() {
        let mut rng_a = SmallRng::seed_from_u64(42);
        let mut rng_b = SmallRng::seed_from_u64(42);
        let a = call("wiener", &[0.0], &mut rng_a).unwrap();
        let b = call("wiener", &[0.0], &mut rng_b).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn unknown_name_is_an_error() {
        let mut rng = SmallRng::seed_from_u64(0);
        assert!(call("bogus", &[], &mut rng).is_err());
    }
}
