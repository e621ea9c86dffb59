use patchbay_core::CoreContext;

#[derive(Clone)]
pub struct AppState {
	pub core: CoreContext,
}
