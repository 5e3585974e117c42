#[cfg(feature = "generate")]
fn main() {
    let root = std::path::Path::new(env!("CARGO_MANIFEST_DIR"));

    prost_build::Config::new()
        .out_dir(root.join("src"))
        .btree_map(["."])
        .extern_path(".google.protobuf", "::pbjson_types")
        .compile_protos(
            &[
                root.join("proto/data.proto"),
                root.join("proto/google/rpc/error.proto"),
            ],
            &[root.join("proto")],
        )
        .expect("failed to compile protobuf");
}

#[cfg(not(feature = "generate"))]
fn main() {}
