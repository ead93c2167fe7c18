//! String hiding.
//!
//! Every distinct literal used by an eligible method is folded into one
//! per-module byte blob, masked so a plaintext scan of the binary finds
//! nothing. A synthesized private type carries the blob, a decoded-string
//! cache, a shared decode routine, and one small accessor per distinct
//! string; every literal-load site is rewritten in place into a call to its
//! accessor, keeping the original debug line association.

use crate::obfuscator::Obfuscator;
use indexmap::IndexMap;
use tracing::debug;
use umbra_core::model::{
    CallTarget, FieldDef, HiddenString, HiddenStrings, Instruction, MethodBody, MethodDef,
    MethodSlot, ModuleId, Opcode, TypeDef, TypeId,
};
use umbra_utils::errors::TransformError;

/// Position-dependent mask applied to every blob byte. Applying it twice
/// restores the original byte.
fn mask_byte(byte: u8, pos: usize) -> u8 {
    byte ^ (pos as u8) ^ 0xAA
}

/// Reverses the mask over `blob[offset..offset + len]` and rebuilds the
/// original string. This mirrors the decode routine the transform emits.
pub fn decode_hidden(blob: &[u8], offset: usize, len: usize) -> Result<String, TransformError> {
    if offset + len > blob.len() {
        return Err(TransformError::RangeOutOfBounds { offset, len });
    }
    let bytes: Vec<u8> = blob[offset..offset + len]
        .iter()
        .enumerate()
        .map(|(i, &b)| mask_byte(b, offset + i))
        .collect();
    Ok(String::from_utf8(bytes)?)
}

impl Obfuscator {
    /// Replaces literal strings with encoded-blob accessors, per module.
    pub fn hide_strings(&mut self) {
        if !self.project.settings.hide_strings {
            return;
        }
        for m in 0..self.set.modules.len() {
            if self.set.modules[m].external {
                continue;
            }
            self.hide_module_strings(m);
        }
    }

    fn hide_module_strings(&mut self, m: ModuleId) {
        // Distinct literals in first-seen order, with every load site.
        // Deduplication is byte-for-byte and local to this module.
        let mut sites: IndexMap<String, Vec<(TypeId, usize, usize)>> = IndexMap::new();
        for t in 0..self.set.modules[m].types.len() {
            if !self.should_rename_type(m, t) {
                continue;
            }
            for mi in 0..self.set.modules[m].types[t].methods.len() {
                let key = self.original_method_key(m, t, mi);
                if self.project.should_skip_string_hiding(&key) {
                    continue;
                }
                let Some(body) = &self.set.modules[m].types[t].methods[mi].body else {
                    continue;
                };
                for (ii, instr) in body.instructions.iter().enumerate() {
                    if let Opcode::LdStr(value) = &instr.op {
                        sites.entry(value.clone()).or_default().push((t, mi, ii));
                    }
                }
            }
        }
        if sites.is_empty() {
            return;
        }

        let container_id = self.set.modules[m].types.len();
        let decoder_slot = MethodSlot {
            ty: container_id,
            method: 0,
        };

        // The container name embeds the module index, so repeated runs over
        // the same input produce identical output.
        let mut container = TypeDef::new(
            String::new(),
            format!("<PrivateImplementationDetails>{{{m:08X}}}"),
        );

        let data_field = self.maker.member_name(0);
        let cache_field = self.maker.member_name(1);
        container
            .fields
            .push(FieldDef::new(data_field.clone(), "System.Byte[]"));
        container
            .fields
            .push(FieldDef::new(cache_field.clone(), "System.String[]"));

        // Shared decode routine: unmask the byte range, build the string,
        // park it in the cache slot.
        let mut decoder = MethodDef::new(self.maker.member_name(0));
        decoder.return_type = "System.String".to_owned();
        for i in 0..3 {
            decoder.params.push(umbra_core::model::ParamDef {
                name: self.maker.member_name(i),
                param_type: "System.Int32".to_owned(),
            });
        }
        decoder.body = Some(MethodBody {
            locals: vec!["System.String".to_owned()],
            instructions: vec![
                Instruction::new(Opcode::Other("call System.Text.Encoding::get_UTF8".into())),
                Instruction::new(Opcode::Other(format!("ldsfld {data_field}"))),
                Instruction::new(Opcode::Other("ldarg.1".into())),
                Instruction::new(Opcode::Other("ldarg.2".into())),
                Instruction::new(Opcode::Other(
                    "callvirt System.Text.Encoding::GetString".into(),
                )),
                Instruction::new(Opcode::Other("stloc.0".into())),
                Instruction::new(Opcode::Other(format!("ldsfld {cache_field}"))),
                Instruction::new(Opcode::Other("ldarg.0".into())),
                Instruction::new(Opcode::Other("ldloc.0".into())),
                Instruction::new(Opcode::Other("stelem.ref".into())),
                Instruction::new(Opcode::Other("ldloc.0".into())),
                Instruction::new(Opcode::Ret),
            ],
        });
        container.methods.push(decoder);

        let mut blob: Vec<u8> = Vec::new();
        let mut entries: Vec<HiddenString> = Vec::new();
        for (i, value) in sites.keys().enumerate() {
            let offset = blob.len();
            blob.extend_from_slice(value.as_bytes());
            let len = value.len();

            // Accessor: return the cached string, or decode on first use.
            let mut accessor = MethodDef::new(self.maker.member_name(i + 1));
            accessor.is_public = true;
            accessor.return_type = "System.String".to_owned();
            accessor.body = Some(MethodBody {
                locals: Vec::new(),
                instructions: vec![
                    Instruction::new(Opcode::Other(format!("ldsfld {cache_field}"))),
                    Instruction::new(Opcode::Ldc(i as i32)),
                    Instruction::new(Opcode::Other("ldelem.ref".into())),
                    Instruction::new(Opcode::Other("dup".into())),
                    Instruction::new(Opcode::Other("brtrue.s ret".into())),
                    Instruction::new(Opcode::Other("pop".into())),
                    Instruction::new(Opcode::Ldc(i as i32)),
                    Instruction::new(Opcode::Ldc(offset as i32)),
                    Instruction::new(Opcode::Ldc(len as i32)),
                    Instruction::new(Opcode::Call(CallTarget::Slot(decoder_slot))),
                    Instruction::new(Opcode::Ret),
                ],
            });
            entries.push(HiddenString {
                index: i,
                offset,
                len,
                accessor: MethodSlot {
                    ty: container_id,
                    method: container.methods.len(),
                },
            });
            container.methods.push(accessor);
        }

        // Class initializer: allocate the cache, copy the blob, unmask it.
        let mut cctor = MethodDef::new(".cctor");
        cctor.is_special_name = true;
        cctor.body = Some(MethodBody {
            locals: vec!["System.Int32".to_owned()],
            instructions: vec![
                Instruction::new(Opcode::Ldc(entries.len() as i32)),
                Instruction::new(Opcode::Other("newarr System.String".into())),
                Instruction::new(Opcode::Other(format!("stsfld {cache_field}"))),
                Instruction::new(Opcode::Ldc(blob.len() as i32)),
                Instruction::new(Opcode::Other("newarr System.Byte".into())),
                Instruction::new(Opcode::Other(format!("ldtoken {data_field}"))),
                Instruction::new(Opcode::Other(
                    "call System.Runtime.CompilerServices.RuntimeHelpers::InitializeArray".into(),
                )),
                Instruction::new(Opcode::Other(format!("stsfld {data_field}"))),
                Instruction::new(Opcode::Other("br.s check".into())),
                Instruction::new(Opcode::Other("loop: ldsfld/xor/stelem.i1".into())),
                Instruction::new(Opcode::Other("check: blt loop".into())),
                Instruction::new(Opcode::Ret),
            ],
        });
        container.methods.push(cctor);

        // Mask in place now that the layout is final.
        for (i, byte) in blob.iter_mut().enumerate() {
            *byte = mask_byte(*byte, i);
        }
        container.fields[0].initial_value = Some(blob.clone());

        // Rewrite every load site into a call to its accessor, carrying the
        // debug association over to the replacement instruction.
        for (i, string_sites) in sites.values().enumerate() {
            let accessor = entries[i].accessor;
            for &(t, mi, ii) in string_sites {
                if let Some(body) = self.set.modules[m].types[t].methods[mi].body.as_mut() {
                    if let Some(instr) = body.instructions.get_mut(ii) {
                        let seq = instr.seq.take();
                        *instr = Instruction {
                            op: Opcode::Call(CallTarget::Slot(accessor)),
                            seq,
                        };
                    }
                }
            }
        }

        debug!(
            "module {}: hid {} strings in {} bytes",
            self.set.modules[m].name,
            entries.len(),
            blob.len()
        );
        self.set.modules[m].types.push(container);
        self.set.modules[m].hidden_strings = Some(HiddenStrings {
            container: container_id,
            blob,
            entries,
        });
    }
}
