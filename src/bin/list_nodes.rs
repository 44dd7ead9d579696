//! Print the nodes slow-log collection would visit

use std::env;

use valkey_diag::client::ConnectionFactory;
use valkey_diag::cluster::{NodeAddress, TopologyDiscoverer};
use valkey_diag::config::AuthConfig;

fn usage(args: &[String]) -> String {
    let program = args.first().map_or("list_nodes", String::as_str);
    format!("Usage: {} <host:port> [password]", program)
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args: Vec<String> = env::args().collect();
    if args.len() < 2 {
        eprintln!("{}", usage(&args));
        std::process::exit(1);
    }

    let seed: NodeAddress = args[1].parse()?;
    let factory = ConnectionFactory {
        auth: args.get(2).map(|password| AuthConfig {
            password: password.clone(),
            username: None,
        }),
        ..Default::default()
    };

    let discovery = TopologyDiscoverer::new(&factory).discover(&seed)?;
    println!("{} ({} nodes)", discovery.mode, discovery.nodes.len());
    for node in &discovery.nodes {
        println!("  {}", node);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_usage_without_argv() {
        assert_eq!(usage(&[]), "Usage: list_nodes <host:port> [password]");
        assert_eq!(
            usage(&["./list_nodes".to_string()]),
            "Usage: ./list_nodes <host:port> [password]"
        );
    }
}
