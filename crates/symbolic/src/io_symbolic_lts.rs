use std::io::Read;

use symck_aterm::ATerm;
use symck_aterm::ATermList;
use symck_aterm::ATermRead;
use symck_aterm::ATermStreamable;
use symck_aterm::BinaryATermReader;
use symck_aterm::Symbol;
use symck_data::DataSpecification;
use symck_io::BitStreamRead;
use symck_ldd::BinaryLddReader;
use symck_ldd::Storage;
use symck_utilities::SymckError;

use crate::SummandGroup;
use crate::SymbolicLts;

/// Reads a symbolic LTS from a binary stream.
pub fn read_symbolic_lts<R: Read>(reader: R, storage: &mut Storage) -> Result<SymbolicLts, SymckError> {
    let aterm_stream = BinaryATermReader::new(reader)?;
    let mut stream = BinaryLddReader::new(aterm_stream)?;

    if ATermRead::read_aterm(&mut stream)? != Some(symbolic_labelled_transition_system_mark()) {
        return Err("Expected symbolic labelled transition system stream".into());
    }

    let data_spec = DataSpecification::read(&mut stream)?;
    let process_parameters_list: ATermList<ATerm> = stream.read_aterm()?.ok_or("Expected process parameters")?.into();
    let process_parameters: Vec<ATerm> = process_parameters_list.iter().collect();

    let initial_state = stream.read_ldd(storage)?;
    let states = stream.read_ldd(storage)?;

    // Read the values for the process parameters.
    for _parameter in &process_parameters {
        let num_of_entries = stream.read_integer()?;

        for _ in 0..num_of_entries {
            let _value = stream.read_aterm()?;
        }
    }

    // Read the action labels.
    let num_of_action_labels = stream.read_integer()?;
    for _ in 0..num_of_action_labels {
        let _action_label = stream.read_aterm()?;
    }

    // Read the summand groups.
    let mut summand_groups = Vec::new();
    let num_of_groups = stream.read_integer()?;
    for _ in 0..num_of_groups {
        let read_parameters: Vec<ATerm> = stream.read_aterm_iter()?.collect::<Result<Vec<_>, _>>()?;
        let write_parameters: Vec<ATerm> = stream.read_aterm_iter()?.collect::<Result<Vec<_>, _>>()?;

        let relation = stream.read_ldd(storage)?;

        summand_groups.push(SummandGroup::new(storage, &process_parameters, read_parameters, write_parameters, relation)?);
    }

    Ok(SymbolicLts::new(data_spec, states, initial_state, summand_groups))
}

/// Returns the ATerm mark for symbolic labelled transition systems.
fn symbolic_labelled_transition_system_mark() -> ATerm {
    ATerm::constant(&Symbol::new("symbolic_labelled_transition_system", 0))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_symbolic_lts_rejects_wrong_mark() {
        // An ATerm stream whose first term is not the expected mark should be rejected
        // rather than silently parsed as an empty LTS.
        use symck_aterm::BinaryATermWriter;

        let mut storage = Storage::new();
        let mut buffer = Vec::new();
        {
            let mut writer = BinaryATermWriter::new(&mut buffer).unwrap();
            writer.write(&ATerm::constant(&Symbol::new("not_a_symbolic_lts", 0))).unwrap();
            writer.flush().unwrap();
        }

        let result = read_symbolic_lts(&buffer[..], &mut storage);
        assert!(result.is_err());
    }
}
