use shadow_rs::ShadowBuilder;

// Emits the `build` module used for `--version` and the default app version
fn main() {
    ShadowBuilder::builder()
        .build()
        .expect("shadow-rs could not generate build metadata");
}
