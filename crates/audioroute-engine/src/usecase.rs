//! Use-case selection.

use audioroute_core::{Error, Result};
use audioroute_mixer::apply_ctls;

use crate::manager::{ConfigManager, State, StreamHandle};

impl ConfigManager {
    /// Apply the controls of one case of a stream use-case.
    ///
    /// When several `<usecase>` blocks share `setting`, the first one that
    /// has `case` wins.
    pub fn apply_use_case(&self, stream: &StreamHandle, setting: &str, case: &str) -> Result<()> {
        tracing::debug!(setting, case, "apply_use_case");

        let mut guard = self.state.lock();
        let State { mixer, model } = &mut *guard;
        let found = model.stream_mut(stream.id).and_then(|s| {
            s.usecases
                .iter_mut()
                .filter(|uc| uc.name == setting)
                .find_map(|uc| uc.case_mut(case))
        });

        let Some(found) = found else {
            tracing::error!(setting, case, "use-case not declared");
            return Err(Error::NotSupported(format!(
                "use-case '{setting}' has no case '{case}'"
            )));
        };

        apply_ctls(mixer.as_mut(), &mut found.ctls);
        Ok(())
    }
}
