#[cfg(feature = "cuda")]
fn main() {
    use cuda_builder::CudaBuilder;
    use std::{env, path::PathBuf};

    println!("cargo:rerun-if-changed=../dot_gpu/src");

    let out_path = PathBuf::from(env::var("OUT_DIR").unwrap());
    CudaBuilder::new("../dot_gpu")
        .copy_to(out_path.join("dot_gpu.ptx"))
        .build()
        .unwrap();
}

#[cfg(not(feature = "cuda"))]
fn main() {
    println!("cargo:rerun-if-changed=build.rs");
}
