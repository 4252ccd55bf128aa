// Trunk entrypoint. Without `web` on wasm32 there is nothing to mount.

#[cfg(all(feature = "web", target_arch = "wasm32"))]
#[wasm_bindgen::prelude::wasm_bindgen(start)]
pub fn mount() {
    epo_web::start();
}

fn main() {}
