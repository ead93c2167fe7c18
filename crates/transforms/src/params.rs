//! Parameter and generic-parameter renaming.
//!
//! Parameter names never cross module boundaries, so there is nothing to
//! retarget and nothing to record in the ledger; each owner simply restarts
//! the name sequence from zero.

use crate::obfuscator::Obfuscator;

impl Obfuscator {
    /// Renames method parameters, method generic parameters, and type
    /// generic parameters in every eligible type.
    pub fn rename_params(&mut self) {
        for m in 0..self.set.modules.len() {
            if self.set.modules[m].external {
                continue;
            }
            for t in 0..self.set.modules[m].types.len() {
                if !self.should_rename_type(m, t) {
                    continue;
                }
                let type_key = self.original_type_key(m, t);
                if self.project.should_skip_type(&type_key) {
                    continue;
                }
                if Self::obfuscation_attr(&self.set.modules[m].types[t].attributes)
                    .is_some_and(|a| a.exclude)
                {
                    continue;
                }

                for mi in 0..self.set.modules[m].types[t].methods.len() {
                    let excluded = {
                        let ty = &self.set.modules[m].types[t];
                        !Self::should_obfuscate(&ty.methods[mi].attributes, &ty.attributes)
                    };
                    if excluded {
                        continue;
                    }
                    let maker = self.maker;
                    let method = &mut self.set.modules[m].types[t].methods[mi];
                    for (i, param) in method.params.iter_mut().enumerate() {
                        param.name = maker.member_name(i);
                    }
                    for (i, generic) in method.generic_params.iter_mut().enumerate() {
                        *generic = maker.member_name(i);
                    }
                }

                let maker = self.maker;
                let ty = &mut self.set.modules[m].types[t];
                for (i, generic) in ty.generic_params.iter_mut().enumerate() {
                    *generic = maker.member_name(i);
                }
            }
        }
    }
}
