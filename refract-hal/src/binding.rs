//! Backend-agnostic pieces of the binding model: flattening pipeline
//! layout parameters into single contiguous ranges for backends whose
//! native binding model has no per-binding granularity, and the payload
//! storage behind descriptor tables on those backends.

use thiserror::Error;

#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum PipelineLayoutError {
    #[error("descriptor table parameter contains no ranges")]
    EmptyTable,
    #[error("unbounded descriptor ranges cannot be merged")]
    UnboundedRange,
    #[error("arrayed bindings cannot be merged")]
    ArrayedBinding,
    #[error("register spaces other than zero are not supported by this backend")]
    RegisterSpace,
    #[error("descriptor ranges of different types cannot share a parameter")]
    TypeMismatch,
    #[error("binding and register indices do not advance at the same stride")]
    NonContiguous,
    #[error("descriptor ranges overlap")]
    Overlap,
}

#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum DescriptorError {
    #[error("descriptor data does not match the table's descriptor type")]
    TypeMismatch,
    #[error("descriptor range exceeds the table bounds")]
    OutOfRange,
    #[error("handle does not reference a descriptor table")]
    InvalidTable,
    #[error("layout parameter does not describe a descriptor table")]
    InvalidParam,
}

/// The flattened form of one pipeline layout parameter: a single "this
/// many slots starting at this native register" range.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MergedParam {
    /// A range of 32-bit constants, bound as a constant buffer register.
    Constants {
        register: u32,
        count: u32,
        visibility: api::ShaderStages,
    },
    /// A contiguous run of same-typed descriptors.
    Descriptors {
        ty: api::DescriptorType,
        base_binding: u32,
        register: u32,
        count: u32,
        visibility: api::ShaderStages,
        /// Whether the parameter is updated through `push_descriptors`
        /// rather than bound tables.
        push: bool,
    },
}

impl MergedParam {
    pub const fn visibility(&self) -> api::ShaderStages {
        match *self {
            Self::Constants { visibility, .. } => visibility,
            Self::Descriptors { visibility, .. } => visibility,
        }
    }

    pub const fn register(&self) -> u32 {
        match *self {
            Self::Constants { register, .. } => register,
            Self::Descriptors { register, .. } => register,
        }
    }
}

/// Folds the sub-ranges of each layout parameter into one contiguous
/// merged range.
///
/// Merging requires that all sub-ranges of a parameter share one
/// descriptor type and register space, are not arrayed, and that binding
/// indices and native register indices advance in lockstep. Any
/// violation fails the whole call; no partial layout is produced.
pub fn merge_layout_params(
    params: &[api::PipelineLayoutParam],
) -> Result<Vec<MergedParam>, PipelineLayoutError> {
    let mut merged = Vec::with_capacity(params.len());

    for param in params {
        merged.push(match *param {
            api::PipelineLayoutParam::PushConstants(ref constants) => {
                if constants.dx_register_space != 0 {
                    return Err(PipelineLayoutError::RegisterSpace);
                }
                MergedParam::Constants {
                    register: constants.dx_register_index,
                    count: constants.count,
                    visibility: constants.visibility,
                }
            }
            api::PipelineLayoutParam::PushDescriptors(ref range) => {
                if range.dx_register_space != 0 {
                    return Err(PipelineLayoutError::RegisterSpace);
                }
                MergedParam::Descriptors {
                    ty: range.ty,
                    base_binding: range.binding,
                    register: range.dx_register_index,
                    count: range.count,
                    visibility: range.visibility,
                    push: true,
                }
            }
            api::PipelineLayoutParam::DescriptorTable { ref ranges } => {
                let merged_range = merge_ranges(ranges)?;
                MergedParam::Descriptors {
                    ty: merged_range.ty,
                    base_binding: merged_range.binding,
                    register: merged_range.dx_register_index,
                    count: merged_range.count,
                    visibility: merged_range.visibility,
                    push: false,
                }
            }
        });
    }

    Ok(merged)
}

fn merge_ranges(
    ranges: &[api::DescriptorRange],
) -> Result<api::DescriptorRange, PipelineLayoutError> {
    let mut merged = match ranges.first() {
        Some(first) => *first,
        None => return Err(PipelineLayoutError::EmptyTable),
    };
    validate_range(&merged)?;

    for range in &ranges[1..] {
        validate_range(range)?;
        if range.ty != merged.ty {
            return Err(PipelineLayoutError::TypeMismatch);
        }
        if range.dx_register_space != merged.dx_register_space {
            return Err(PipelineLayoutError::RegisterSpace);
        }

        if range.binding >= merged.binding {
            let distance = range.binding - merged.binding;
            if range.dx_register_index.wrapping_sub(merged.dx_register_index) != distance {
                return Err(PipelineLayoutError::NonContiguous);
            }
            if merged.count > distance {
                return Err(PipelineLayoutError::Overlap);
            }
            merged.count = distance + range.count;
        } else {
            let distance = merged.binding - range.binding;
            if merged.dx_register_index.wrapping_sub(range.dx_register_index) != distance {
                return Err(PipelineLayoutError::NonContiguous);
            }
            if range.count > distance {
                return Err(PipelineLayoutError::Overlap);
            }
            merged.binding = range.binding;
            merged.dx_register_index = range.dx_register_index;
            merged.count += distance;
        }
        merged.visibility |= range.visibility;
    }

    Ok(merged)
}

fn validate_range(range: &api::DescriptorRange) -> Result<(), PipelineLayoutError> {
    if range.count == u32::MAX {
        return Err(PipelineLayoutError::UnboundedRange);
    }
    if range.array_size > 1 {
        return Err(PipelineLayoutError::ArrayedBinding);
    }
    if range.dx_register_space != 0 {
        return Err(PipelineLayoutError::RegisterSpace);
    }
    Ok(())
}

/// The concrete payload of one descriptor table on backends that keep
/// tables in host memory.
///
/// Descriptors are stored as 64-bit words; a descriptor of type `T`
/// occupies `T::slot_width()` consecutive words (handles for sampler and
/// view descriptors, handle plus offset plus size for constant-buffer
/// ranges).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DescriptorTableData {
    pub ty: api::DescriptorType,
    pub count: u32,
    pub base_binding: u32,
    payload: Vec<u64>,
}

impl DescriptorTableData {
    pub fn new(ty: api::DescriptorType, count: u32, base_binding: u32) -> Self {
        Self {
            ty,
            count,
            base_binding,
            payload: vec![0; count as usize * ty.slot_width()],
        }
    }

    /// Creates the table shape for layout parameter `param`, which must
    /// describe a (non-push) descriptor table.
    pub fn for_param(param: &MergedParam) -> Result<Self, DescriptorError> {
        match *param {
            MergedParam::Descriptors {
                ty,
                base_binding,
                count,
                ..
            } => Ok(Self::new(ty, count, base_binding)),
            MergedParam::Constants { .. } => Err(DescriptorError::InvalidParam),
        }
    }

    pub fn words(&self) -> &[u64] {
        &self.payload
    }

    /// Writes `data` starting at `binding`/`array_offset`. The data's
    /// descriptor type must match the table's and the range must fit.
    pub fn write(
        &mut self,
        binding: u32,
        array_offset: u32,
        data: &api::DescriptorData,
    ) -> Result<(), DescriptorError> {
        if data.ty() != self.ty {
            return Err(DescriptorError::TypeMismatch);
        }

        let width = self.ty.slot_width();
        let first = binding
            .wrapping_sub(self.base_binding)
            .wrapping_add(array_offset) as usize;
        let count = data.len();
        if first.checked_add(count).map_or(true, |end| end > self.count as usize) {
            return Err(DescriptorError::OutOfRange);
        }

        let words = &mut self.payload[first * width..(first + count) * width];
        match *data {
            api::DescriptorData::Samplers(ref samplers) => {
                for (slot, sampler) in words.iter_mut().zip(samplers) {
                    *slot = sampler.0;
                }
            }
            api::DescriptorData::ShaderResourceViews(ref views)
            | api::DescriptorData::UnorderedAccessViews(ref views) => {
                for (slot, view) in words.iter_mut().zip(views) {
                    *slot = view.0;
                }
            }
            api::DescriptorData::SamplerWithResourceViews(ref pairs) => {
                for (slot, &(sampler, view)) in words.chunks_exact_mut(2).zip(pairs) {
                    slot[0] = sampler.0;
                    slot[1] = view.0;
                }
            }
            api::DescriptorData::ConstantBuffers(ref buffers) => {
                for (slot, range) in words.chunks_exact_mut(3).zip(buffers) {
                    slot[0] = range.buffer.0;
                    slot[1] = range.offset;
                    slot[2] = range.size;
                }
            }
        }
        Ok(())
    }

    /// Reads the descriptor payload back out, for binding or push paths.
    pub fn slice(&self, first: u32, count: u32) -> Result<&[u64], DescriptorError> {
        let width = self.ty.slot_width();
        let first = first as usize;
        let count = count as usize;
        if first + count > self.count as usize {
            return Err(DescriptorError::OutOfRange);
        }
        Ok(&self.payload[first * width..(first + count) * width])
    }
}

/// Copies `copy.count` descriptors between two tables. Exactly
/// `count * slot_width(ty)` payload words move; the types of both tables
/// must match.
pub fn copy_descriptors(
    source: &DescriptorTableData,
    dest: &mut DescriptorTableData,
    copy: &api::DescriptorTableCopy,
) -> Result<(), DescriptorError> {
    if source.ty != dest.ty {
        return Err(DescriptorError::TypeMismatch);
    }

    let width = source.ty.slot_width();
    let src_first = copy
        .source_binding
        .wrapping_sub(source.base_binding)
        .wrapping_add(copy.source_array_offset) as usize;
    let dst_first = copy
        .dest_binding
        .wrapping_sub(dest.base_binding)
        .wrapping_add(copy.dest_array_offset) as usize;
    let count = copy.count as usize;

    if src_first.checked_add(count).map_or(true, |end| end > source.count as usize)
        || dst_first.checked_add(count).map_or(true, |end| end > dest.count as usize)
    {
        return Err(DescriptorError::OutOfRange);
    }

    dest.payload[dst_first * width..(dst_first + count) * width]
        .copy_from_slice(&source.payload[src_first * width..(src_first + count) * width]);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use api::{
        DescriptorRange, DescriptorType, PipelineLayoutParam, ShaderStages,
    };

    fn range(
        binding: u32,
        register: u32,
        count: u32,
        ty: DescriptorType,
        visibility: ShaderStages,
    ) -> DescriptorRange {
        DescriptorRange {
            binding,
            dx_register_index: register,
            dx_register_space: 0,
            count,
            array_size: 1,
            ty,
            visibility,
        }
    }

    #[test]
    fn contiguous_ranges_merge_to_sum_and_union() {
        let params = [PipelineLayoutParam::DescriptorTable {
            ranges: vec![
                range(0, 4, 2, DescriptorType::ShaderResourceView, ShaderStages::VERTEX),
                range(2, 6, 3, DescriptorType::ShaderResourceView, ShaderStages::PIXEL),
            ],
        }];

        let merged = merge_layout_params(&params).unwrap();
        assert_eq!(
            merged,
            vec![MergedParam::Descriptors {
                ty: DescriptorType::ShaderResourceView,
                base_binding: 0,
                register: 4,
                count: 5,
                visibility: ShaderStages::VERTEX | ShaderStages::PIXEL,
                push: false,
            }]
        );
    }

    #[test]
    fn merge_handles_descending_binding_order() {
        let params = [PipelineLayoutParam::DescriptorTable {
            ranges: vec![
                range(3, 8, 1, DescriptorType::Sampler, ShaderStages::PIXEL),
                range(0, 5, 2, DescriptorType::Sampler, ShaderStages::PIXEL),
            ],
        }];

        let merged = merge_layout_params(&params).unwrap();
        assert_eq!(
            merged,
            vec![MergedParam::Descriptors {
                ty: DescriptorType::Sampler,
                base_binding: 0,
                register: 5,
                count: 4,
                visibility: ShaderStages::PIXEL,
                push: false,
            }]
        );
    }

    #[test]
    fn merge_rejects_type_mismatch() {
        let params = [PipelineLayoutParam::DescriptorTable {
            ranges: vec![
                range(0, 0, 1, DescriptorType::Sampler, ShaderStages::PIXEL),
                range(1, 1, 1, DescriptorType::ShaderResourceView, ShaderStages::PIXEL),
            ],
        }];
        assert_eq!(
            merge_layout_params(&params),
            Err(PipelineLayoutError::TypeMismatch)
        );
    }

    #[test]
    fn merge_rejects_register_stride_mismatch() {
        let params = [PipelineLayoutParam::DescriptorTable {
            ranges: vec![
                range(0, 0, 1, DescriptorType::ConstantBuffer, ShaderStages::VERTEX),
                // Binding advances by 1, register by 2.
                range(1, 2, 1, DescriptorType::ConstantBuffer, ShaderStages::VERTEX),
            ],
        }];
        assert_eq!(
            merge_layout_params(&params),
            Err(PipelineLayoutError::NonContiguous)
        );
    }

    #[test]
    fn merge_rejects_overlap_and_empty() {
        let params = [PipelineLayoutParam::DescriptorTable {
            ranges: vec![
                range(0, 0, 3, DescriptorType::Sampler, ShaderStages::PIXEL),
                range(1, 1, 1, DescriptorType::Sampler, ShaderStages::PIXEL),
            ],
        }];
        assert_eq!(merge_layout_params(&params), Err(PipelineLayoutError::Overlap));

        let params = [PipelineLayoutParam::DescriptorTable { ranges: vec![] }];
        assert_eq!(
            merge_layout_params(&params),
            Err(PipelineLayoutError::EmptyTable)
        );
    }

    #[test]
    fn merge_is_idempotent_on_single_ranges() {
        let params = [PipelineLayoutParam::DescriptorTable {
            ranges: vec![range(
                1,
                1,
                4,
                DescriptorType::UnorderedAccessView,
                ShaderStages::COMPUTE,
            )],
        }];
        let once = merge_layout_params(&params).unwrap();
        // Feeding the merged shape back through produces the same result.
        let again = merge_layout_params(&[PipelineLayoutParam::DescriptorTable {
            ranges: vec![range(
                1,
                1,
                4,
                DescriptorType::UnorderedAccessView,
                ShaderStages::COMPUTE,
            )],
        }])
        .unwrap();
        assert_eq!(once, again);
    }

    #[test]
    fn table_write_moves_slot_width_words() {
        let mut table = DescriptorTableData::new(DescriptorType::ConstantBuffer, 4, 0);
        table
            .write(
                1,
                0,
                &api::DescriptorData::ConstantBuffers(vec![api::BufferRange {
                    buffer: api::Resource(0xAA),
                    offset: 16,
                    size: 256,
                }]),
            )
            .unwrap();

        // Exactly three words at slot 1, nothing else.
        assert_eq!(table.words()[0..3], [0, 0, 0]);
        assert_eq!(table.words()[3..6], [0xAA, 16, 256]);
        assert_eq!(table.words()[6..], [0, 0, 0, 0, 0, 0]);
    }

    #[test]
    fn table_write_rejects_type_and_bounds() {
        let mut table = DescriptorTableData::new(DescriptorType::Sampler, 2, 0);
        assert_eq!(
            table.write(
                0,
                0,
                &api::DescriptorData::ShaderResourceViews(vec![api::ResourceView(1)])
            ),
            Err(DescriptorError::TypeMismatch)
        );
        assert_eq!(
            table.write(
                1,
                0,
                &api::DescriptorData::Samplers(vec![api::Sampler(1), api::Sampler(2)])
            ),
            Err(DescriptorError::OutOfRange)
        );
    }

    #[test]
    fn copy_moves_exact_word_count_at_offsets() {
        let mut source = DescriptorTableData::new(DescriptorType::ShaderResourceView, 4, 0);
        source
            .write(
                0,
                0,
                &api::DescriptorData::ShaderResourceViews(vec![
                    api::ResourceView(1),
                    api::ResourceView(2),
                    api::ResourceView(3),
                    api::ResourceView(4),
                ]),
            )
            .unwrap();
        let mut dest = DescriptorTableData::new(DescriptorType::ShaderResourceView, 4, 0);

        copy_descriptors(
            &source,
            &mut dest,
            &api::DescriptorTableCopy {
                source_table: api::DescriptorTable::NULL,
                source_binding: 1,
                source_array_offset: 0,
                dest_table: api::DescriptorTable::NULL,
                dest_binding: 2,
                dest_array_offset: 0,
                count: 2,
            },
        )
        .unwrap();

        assert_eq!(dest.words(), &[0, 0, 2, 3]);
    }

    #[test]
    fn copy_rejects_cross_type() {
        let source = DescriptorTableData::new(DescriptorType::Sampler, 1, 0);
        let mut dest = DescriptorTableData::new(DescriptorType::ConstantBuffer, 1, 0);
        assert_eq!(
            copy_descriptors(
                &source,
                &mut dest,
                &api::DescriptorTableCopy {
                    source_table: api::DescriptorTable::NULL,
                    source_binding: 0,
                    source_array_offset: 0,
                    dest_table: api::DescriptorTable::NULL,
                    dest_binding: 0,
                    dest_array_offset: 0,
                    count: 1,
                },
            ),
            Err(DescriptorError::TypeMismatch)
        );
    }
}
