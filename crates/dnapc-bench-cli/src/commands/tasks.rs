use console::style;
use dnapc_bench::TaskRegistry;

pub fn handle_tasks() {
    println!("{}", style("Available tasks:").bold());
    for name in TaskRegistry::builtin().available() {
        println!("  {}", style(name).cyan());
    }
}
