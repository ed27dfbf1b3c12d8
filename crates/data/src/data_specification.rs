use symck_aterm::ATerm;
use symck_aterm::ATermRead;
use symck_aterm::ATermStreamable;
use symck_aterm::ATermWrite;
use symck_utilities::SymckError;

/// TODO: Not yet useful, but can be used to read the data specification from a binary stream.
#[derive(Default)]
pub struct DataSpecification {}

impl ATermStreamable for DataSpecification {
    fn write<W: ATermWrite>(&self, _writer: &mut W) -> Result<(), SymckError> {
        unimplemented!()
    }

    fn read<R: ATermRead>(reader: &mut R) -> Result<Self, SymckError>
    where
        Self: Sized,
    {
        let _sorts: Result<Vec<ATerm>, SymckError> = reader.read_aterm_iter()?.collect();
        let _aliases: Result<Vec<ATerm>, SymckError> = reader.read_aterm_iter()?.collect();
        let _constructors: Result<Vec<ATerm>, SymckError> = reader.read_aterm_iter()?.collect();
        let _user_defined_mappings: Result<Vec<ATerm>, SymckError> = reader.read_aterm_iter()?.collect();
        let _user_defined_equations: Result<Vec<ATerm>, SymckError> = reader.read_aterm_iter()?.collect();

        // Ignore results for now.
        Ok(DataSpecification {})
    }
}
