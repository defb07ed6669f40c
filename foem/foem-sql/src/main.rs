// We put all the code apart from a facade in `lib.rs` so we can easily disable
// its compilation for wasm targets.

#[cfg(not(target_family = "wasm"))]
mod cli;

#[cfg(not(target_family = "wasm"))]
fn main() -> color_eyre::eyre::Result<()> {
    cli::main()
}

#[cfg(target_family = "wasm")]
fn main() {
    panic!("WASM not supported by the `foem-sql` CLI. `foem_sql` is the library.");
}
