use std::io::Read;

use symck_ldd::Storage;
use symck_ldd::SylvanReader;
use symck_ldd::Value;
use symck_ldd::read_u32;
use symck_utilities::SymckError;

use crate::SummandGroup;
use crate::SymbolicLts;

/// Reads the (initial state, transitions) stored in Sylvan's `ldd2bdd` binary format.
///
/// This format carries no process parameter names, only the read/write projections as
/// raw indices, so the resulting summand groups have empty parameter-name lists.
pub fn read_sylvan(storage: &mut Storage, stream: &mut impl Read) -> Result<SymbolicLts, SymckError> {
    let mut reader = SylvanReader::new();

    let _vector_length = read_u32(stream)?;
    let _unused = read_u32(stream)?; // called 'k' in Sylvan's ldd2bdd.c, but unused.

    let initial_state = reader.read_ldd(storage, stream)?;
    let num_transitions: usize = read_u32(stream)? as usize;

    let mut projections = Vec::with_capacity(num_transitions);
    for _ in 0..num_transitions {
        projections.push(read_projection(stream)?);
    }

    let mut summand_groups = Vec::with_capacity(num_transitions);
    for (read_proj, write_proj) in projections {
        let relation = reader.read_ldd(storage, stream)?;
        summand_groups.push(SummandGroup::from_indices(storage, Vec::new(), read_proj, Vec::new(), write_proj, relation));
    }

    Ok(SymbolicLts::new(
        symck_data::DataSpecification::default(),
        storage.empty_set().clone(),
        initial_state,
        summand_groups,
    ))
}

/// Reads the read and write projections from the given stream.
pub fn read_projection(file: &mut impl Read) -> Result<(Vec<Value>, Vec<Value>), SymckError> {
    let num_read = read_u32(file)?;
    let num_write = read_u32(file)?;

    // Read num_read integers for the read parameters.
    let mut read_proj: Vec<Value> = Vec::new();
    for _ in 0..num_read {
        let value = read_u32(file)?;
        read_proj.push(value as Value);
    }

    // Read num_write integers for the write parameters.
    let mut write_proj: Vec<Value> = Vec::new();
    for _ in 0..num_write {
        let value = read_u32(file)?;
        write_proj.push(value as Value);
    }

    Ok((read_proj, write_proj))
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_read_projection_round_trip() {
        // num_read, num_write, then the read indices, then the write indices.
        let mut bytes = Vec::new();
        bytes.extend_from_slice(&2u32.to_le_bytes());
        bytes.extend_from_slice(&1u32.to_le_bytes());
        bytes.extend_from_slice(&0u32.to_le_bytes());
        bytes.extend_from_slice(&2u32.to_le_bytes());
        bytes.extend_from_slice(&1u32.to_le_bytes());

        let (read_proj, write_proj) = read_projection(&mut &bytes[..]).unwrap();
        assert_eq!(read_proj, vec![0, 2]);
        assert_eq!(write_proj, vec![1]);
    }
}
